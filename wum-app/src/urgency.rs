use chrono::NaiveDate;

/// Due-date urgency, computed from the whole-day difference between the due
/// date and "today at midnight". Shared by `/task due` and the reminder job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Overdue { days: i64 },
    DueToday,
    DueTomorrow,
    Upcoming { days: i64 },
}

pub fn classify(due: NaiveDate, today: NaiveDate) -> Urgency {
    let days = (due - today).num_days();
    match days {
        d if d < 0 => Urgency::Overdue { days: -d },
        0 => Urgency::DueToday,
        1 => Urgency::DueTomorrow,
        d => Urgency::Upcoming { days: d },
    }
}

impl Urgency {
    /// One-line banner used in due-date confirmation and notifications.
    pub fn banner(&self) -> String {
        match self {
            Self::Overdue { days } => format!("🔴 **Overdue by {days} day(s)!**"),
            Self::DueToday => "🔴 **Due today!**".to_string(),
            Self::DueTomorrow => "🟠 **Due tomorrow**".to_string(),
            Self::Upcoming { days } => format!("🟢 {days} days left"),
        }
    }

    /// Reminder emoji and tier label; `None` for the not-yet-urgent tier,
    /// which triggers no fan-out.
    pub fn reminder_heading(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Overdue { .. } => Some(("🚨", "overdue")),
            Self::DueToday => Some(("⚠️", "due today")),
            Self::DueTomorrow => Some(("📅", "due tomorrow")),
            Self::Upcoming { .. } => None,
        }
    }
}
