use anyhow::Result;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::task::JoinHandle;

use super::with_context;
use crate::booking::{BookingId, Stage};
use crate::camera::FileCamera;
use crate::workflow::{ServiceCompletionWorkflow, WorkflowAction, WorkflowError, WorkflowOptions, WorkflowStage};

/// Interactive on-site visit for one booking
pub struct WorkCommand {
    pub booking_id: BookingId,
}

/// One line typed at the workflow prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkInput {
    Code(String),
    Photo(String),
    Remove(usize),
    Start,
    Stop,
    Done,
    Status,
    Call,
    Map,
    Help,
    Quit,
}

impl WorkInput {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        match verb.as_str() {
            "code" | "otp" => Ok(WorkInput::Code(arg.to_string())),
            "photo" if !arg.is_empty() => Ok(WorkInput::Photo(arg.to_string())),
            "photo" => Err("usage: photo <path to image>".to_string()),
            "remove" | "rm" => arg
                .parse()
                .map(WorkInput::Remove)
                .map_err(|_| "usage: remove <photo number>".to_string()),
            "start" => Ok(WorkInput::Start),
            "stop" => Ok(WorkInput::Stop),
            "done" | "complete" => Ok(WorkInput::Done),
            "status" | "" => Ok(WorkInput::Status),
            "call" => Ok(WorkInput::Call),
            "map" => Ok(WorkInput::Map),
            "help" | "?" => Ok(WorkInput::Help),
            "quit" | "exit" => Ok(WorkInput::Quit),
            other => Err(format!("unknown command '{other}', type 'help'")),
        }
    }
}

/// Which code the prompt is asking for in this stage. Once work has started
/// only the end code is meaningful.
fn code_stage(stage: WorkflowStage) -> Stage {
    match stage {
        WorkflowStage::AwaitingStartCode | WorkflowStage::StartVerified | WorkflowStage::ReadyToStart => Stage::Start,
        _ => Stage::End,
    }
}

/// Which photo set a capture or removal targets in this stage
fn photo_stage(stage: WorkflowStage) -> Stage {
    if stage.permits(WorkflowAction::CapturePhoto(Stage::Start)) {
        Stage::Start
    } else {
        Stage::End
    }
}

fn print_help() {
    println!("Commands:");
    println!("  code <digits>    enter the start or end code from the customer");
    println!("  photo <path>     take a before/after photo from an image file");
    println!("  remove <n>       drop photo number n from the current list");
    println!("  start            start the work timer");
    println!("  stop             stop the work timer");
    println!("  done             complete the job");
    println!("  status           show progress");
    println!("  call | map       customer phone link, directions link");
    println!("  quit             leave without completing");
}

fn print_status(workflow: &ServiceCompletionWorkflow) {
    let snapshot = workflow.snapshot();
    println!("🧾 Booking {} - {}", snapshot.booking_id, snapshot.stage);
    println!("   ⏱️  {}{}", snapshot.elapsed_display, if snapshot.timer_running { " (running)" } else { "" });
    println!("   📷 before: {}  after: {}", snapshot.before_photos.len(), snapshot.after_photos.len());
    for (label, photos) in [("before", &snapshot.before_photos), ("after", &snapshot.after_photos)] {
        for (i, url) in photos.iter().enumerate() {
            println!("      {label} #{}: {url}", i + 1);
        }
    }
    println!("   👉 {}", next_step(snapshot.stage));
}

fn next_step(stage: WorkflowStage) -> &'static str {
    match stage {
        WorkflowStage::AwaitingStartCode => "ask the customer for the start code: code <digits>",
        WorkflowStage::StartVerified => "take at least one before photo: photo <path>",
        WorkflowStage::ReadyToStart => "start the timer when you begin: start",
        WorkflowStage::Running => "stop the timer when the work is finished: stop",
        WorkflowStage::Stopped => "take at least one after photo: photo <path>",
        WorkflowStage::AwaitingEndCode => "ask the customer for the end code: code <digits>",
        WorkflowStage::EndVerified => "close the job: done",
        WorkflowStage::Completed => "job completed",
    }
}

fn report(err: &WorkflowError) {
    let alert = err.alert();
    println!("❌ {}: {}", alert.title, alert.message);
}

/// Prints a one-off notice once the upload flag goes up
fn spawn_upload_notice(uploading: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if uploading.load(Ordering::SeqCst) {
                println!("⏳ Uploading photo...");
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
}

async fn confirm(lines: &mut Lines<BufReader<Stdin>>, question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

impl WorkCommand {
    pub fn new(booking_id: impl Into<String>) -> Self {
        Self {
            booking_id: BookingId::new(booking_id),
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let booking_id = self.booking_id.clone();
        with_context(|context| async move {
            let booking = context.directory.booking(&booking_id).await?;
            let options = WorkflowOptions::from_config(&context.config.workflow)?;
            let camera = Arc::new(FileCamera::new());

            println!("🛠️  {} - {}", booking.id, booking.display_name());
            if let Some(address) = &booking.full_address {
                println!("   📍 {address}");
            }
            if booking.is_completed() {
                println!("   ⚠️  This booking is already marked completed");
            }

            let mut workflow = ServiceCompletionWorkflow::new(booking, context.backend.clone(), camera.clone(), options);
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            print_status(&workflow);

            loop {
                print!("crewdesk> ");
                std::io::stdout().flush()?;
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let input = match WorkInput::parse(&line) {
                    Ok(input) => input,
                    Err(usage) => {
                        println!("{usage}");
                        continue;
                    }
                };

                let stage = workflow.stage();
                match input {
                    WorkInput::Code(code) => match workflow.submit_code(code_stage(stage), &code) {
                        Ok(_) => println!("✅ Code accepted"),
                        Err(e) => report(&e),
                    },
                    WorkInput::Photo(path) => {
                        camera.load(&path);
                        let notice = workflow
                            .options()
                            .show_upload_overlay
                            .then(|| spawn_upload_notice(workflow.upload_indicator()));
                        let result = workflow.capture_photo(photo_stage(stage)).await;
                        if let Some(notice) = notice {
                            notice.abort();
                        }
                        match result {
                            Ok(Some(capture)) => println!("📷 Uploaded {}", capture.public_url),
                            Ok(None) => println!("Capture cancelled"),
                            Err(e) => report(&e),
                        }
                    }
                    WorkInput::Remove(number) => {
                        match workflow.remove_photo(photo_stage(stage), number.saturating_sub(1)) {
                            Ok(photo) => println!("🗑️  Removed {}", photo.local_uri),
                            Err(e) => report(&e),
                        }
                    }
                    WorkInput::Start => {
                        if !workflow.permits(WorkflowAction::StartWork) {
                            println!("{}", next_step(stage));
                            continue;
                        }
                        if workflow.options().confirm_start
                            && !confirm(&mut lines, "Start the work timer now?").await?
                        {
                            continue;
                        }
                        match workflow.start_work().await {
                            Ok(at) => println!("⏱️  Timer started at {}", at.format("%H:%M:%S")),
                            Err(e) => report(&e),
                        }
                    }
                    WorkInput::Stop => match workflow.stop_work() {
                        Ok(_) => println!("⏹️  Worked {}", workflow.elapsed_display()),
                        Err(e) => report(&e),
                    },
                    WorkInput::Done => match workflow.complete().await {
                        Ok(done) => {
                            println!("🎉 Job {} completed after {}", done.booking_id, workflow.elapsed_display());
                            break;
                        }
                        Err(e) => report(&e),
                    },
                    WorkInput::Status => print_status(&workflow),
                    WorkInput::Call => match workflow.customer_dial_link() {
                        Ok(link) => println!("📞 {link}"),
                        Err(e) => report(&e),
                    },
                    WorkInput::Map => match workflow.directions_link() {
                        Some(link) => println!("🗺️  {link}"),
                        None => println!("No address on file"),
                    },
                    WorkInput::Help => print_help(),
                    WorkInput::Quit => break,
                }
            }

            if workflow.stage() != WorkflowStage::Completed {
                println!("👋 Leaving {} at '{}'; unsaved progress is discarded", workflow.booking().id, workflow.stage());
            }
            Ok(())
        })
        .await
    }
}
