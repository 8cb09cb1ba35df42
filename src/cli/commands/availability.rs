use anyhow::Result;

use super::with_context;

pub struct AvailabilityCommand {
    /// `None` only reports the current value
    pub set_to: Option<bool>,
}

impl AvailabilityCommand {
    pub fn new(set_to: Option<bool>) -> Self {
        Self { set_to }
    }

    pub async fn execute(&self) -> Result<()> {
        let set_to = self.set_to;
        with_context(|context| async move {
            if let Some(available) = set_to {
                context.directory.set_availability(available).await?;
            }
            let view = context.directory.profile().await?;
            if view.profile.is_available {
                println!("🟢 You are available for new jobs");
            } else {
                println!("🔴 You are not taking new jobs");
            }
            Ok(())
        })
        .await
    }
}
