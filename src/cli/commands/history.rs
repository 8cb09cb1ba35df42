use anyhow::Result;
use chrono::NaiveDate;

use super::{print_history_row, with_context};
use crate::booking::HistorySort;
use crate::cli::SortArg;

pub struct HistoryCommand {
    pub sort: HistorySort,
    pub day: Option<NaiveDate>,
}

impl HistoryCommand {
    pub fn new(sort: SortArg, day: Option<NaiveDate>) -> Self {
        let sort = match sort {
            SortArg::Recent => HistorySort::Recent,
            SortArg::Date => HistorySort::Date,
            SortArg::Name => HistorySort::Name,
        };
        Self { sort, day }
    }

    pub async fn execute(&self) -> Result<()> {
        let (sort, day) = (self.sort, self.day);
        with_context(|context| async move {
            let jobs = context.directory.history(sort, day).await?;
            match day {
                Some(day) => println!("📚 COMPLETED ON {day} ({})", jobs.len()),
                None => println!("📚 COMPLETED JOBS ({})", jobs.len()),
            }
            println!("────────────────────");
            if jobs.is_empty() {
                println!("  Nothing here yet");
            }
            for job in &jobs {
                print_history_row(job);
            }
            Ok(())
        })
        .await
    }
}
