use anyhow::Result;

use super::with_context;

/// Badge counters, or the staff profile with `profile = true`
pub struct SummaryCommand {
    pub profile: bool,
}

impl SummaryCommand {
    pub fn counts() -> Self {
        Self { profile: false }
    }

    pub fn profile() -> Self {
        Self { profile: true }
    }

    pub async fn execute(&self) -> Result<()> {
        let show_profile = self.profile;
        with_context(|context| async move {
            if show_profile {
                let view = context.directory.profile().await?;
                let profile = &view.profile;
                println!("👤 {}", profile.name.as_deref().unwrap_or("Unnamed staff member"));
                if let Some(email) = &profile.email {
                    println!("   ✉️  {email}");
                }
                if let Some(phone) = &profile.phone {
                    println!("   📞 {phone}");
                }
                if let Some(avatar) = &view.avatar_link {
                    println!("   🖼️  {avatar}");
                }
                let availability = if profile.is_available { "🟢 Available" } else { "🔴 Not available" };
                println!("   {availability}");
                return Ok(());
            }

            let counts = context.directory.badge_counts().await?;
            println!("📊 JOB SUMMARY");
            println!("────────────────────");
            println!("   🆕 New: {}", counts.new);
            println!("   📋 Assigned: {}", counts.assigned);
            println!("   ✅ Completed: {}", counts.completed);
            Ok(())
        })
        .await
    }
}
