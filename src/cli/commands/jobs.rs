use anyhow::Result;

use super::{print_booking_row, with_context};

/// Lists either the open assigned jobs or the unseen ones
pub struct JobsCommand {
    pub only_new: bool,
}

impl JobsCommand {
    pub fn assigned() -> Self {
        Self { only_new: false }
    }

    pub fn unseen() -> Self {
        Self { only_new: true }
    }

    pub async fn execute(&self) -> Result<()> {
        let only_new = self.only_new;
        with_context(|context| async move {
            let jobs = if only_new {
                context.directory.new_jobs().await?
            } else {
                context.directory.assigned_jobs().await?
            };

            if jobs.is_empty() {
                if only_new {
                    println!("📭 No new jobs");
                } else {
                    println!("📭 No open jobs assigned to you");
                }
                return Ok(());
            }

            if only_new {
                println!("🆕 NEW JOBS ({})", jobs.len());
            } else {
                println!("📋 ASSIGNED JOBS ({})", jobs.len());
            }
            println!("────────────────────");
            for job in &jobs {
                print_booking_row(job);
            }
            println!();
            println!("💡 Run 'crewdesk work <id>' when you arrive on site");
            Ok(())
        })
        .await
    }
}
