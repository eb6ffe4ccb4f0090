//! End-of-run summaries computed over the in-memory export rows.

use crate::records::{MailboxRow, UsageRow};
use crate::ui;

/// Count, sum, mean and maximum of one numeric column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Column {
    pub positive: usize,
    pub sum: f64,
    pub mean: f64,
    pub max: f64,
}

impl Column {
    /// Mean is taken over every value, zeros included.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Self {
        let mut col = Self::default();
        let mut n = 0usize;
        for v in values {
            n += 1;
            col.sum += v;
            if v > 0.0 {
                col.positive += 1;
            }
            if n == 1 || v > col.max {
                col.max = v;
            }
        }
        if n > 0 {
            col.mean = col.sum / n as f64;
        }
        col
    }
}

fn gb(mb: f64) -> String {
    format!("{:.2}", mb / 1024.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageSummary {
    pub users: usize,
    pub with_gmail_data: usize,
    pub with_drive_data: usize,
    pub gmail_storage: Column,
    pub emails_exchanged: Column,
    pub drive_storage: Column,
    pub drive_items: Column,
    pub total_storage: Column,
}

impl UsageSummary {
    pub fn from_rows(rows: &[UsageRow]) -> Self {
        Self {
            users: rows.len(),
            with_gmail_data: rows.iter().filter(|r| r.has_gmail_data).count(),
            with_drive_data: rows.iter().filter(|r| r.has_drive_data).count(),
            gmail_storage: Column::of(rows.iter().map(|r| r.gmail_storage_mb)),
            emails_exchanged: Column::of(rows.iter().map(|r| r.gmail_emails_exchanged as f64)),
            drive_storage: Column::of(rows.iter().map(|r| r.drive_storage_mb)),
            drive_items: Column::of(rows.iter().map(|r| r.drive_item_count as f64)),
            total_storage: Column::of(rows.iter().map(|r| r.total_storage_mb)),
        }
    }

    pub fn print(&self) {
        if self.users == 0 {
            ui::warn("No data collected");
            return;
        }

        ui::header("Usage Summary");
        ui::kv("Total users processed", &self.users.to_string());
        ui::kv("Users with Gmail data", &self.with_gmail_data.to_string());
        ui::kv("Users with Drive data", &self.with_drive_data.to_string());

        if self.gmail_storage.positive > 0 {
            ui::section("Gmail");
            ui::kv(
                "Users with Gmail storage > 0",
                &self.gmail_storage.positive.to_string(),
            );
            ui::kv(
                "Average Gmail storage (MB)",
                &format!("{:.2}", self.gmail_storage.mean),
            );
            ui::kv("Max Gmail storage (MB)", &format!("{:.2}", self.gmail_storage.max));
            ui::kv("Total Gmail storage (GB)", &gb(self.gmail_storage.sum));
            if self.emails_exchanged.positive > 0 {
                ui::kv(
                    "Users with Gmail activity",
                    &self.emails_exchanged.positive.to_string(),
                );
                ui::kv(
                    "Total emails exchanged",
                    &format!("{:.0}", self.emails_exchanged.sum),
                );
                ui::kv(
                    "Average emails per user",
                    &format!("{:.1}", self.emails_exchanged.mean),
                );
            }
        }

        if self.drive_storage.positive > 0 {
            ui::section("Drive");
            ui::kv(
                "Users with Drive storage > 0",
                &self.drive_storage.positive.to_string(),
            );
            ui::kv(
                "Average Drive storage (MB)",
                &format!("{:.2}", self.drive_storage.mean),
            );
            ui::kv("Max Drive storage (MB)", &format!("{:.2}", self.drive_storage.max));
            ui::kv("Total Drive storage (GB)", &gb(self.drive_storage.sum));
            if self.drive_items.positive > 0 {
                ui::kv(
                    "Users with Drive items > 0",
                    &self.drive_items.positive.to_string(),
                );
                ui::kv(
                    "Average Drive item count",
                    &format!("{:.1}", self.drive_items.mean),
                );
                ui::kv("Max Drive item count", &format!("{:.0}", self.drive_items.max));
            }
        }

        if self.total_storage.positive > 0 {
            ui::section("Combined");
            ui::kv(
                "Total storage across all users (GB)",
                &gb(self.total_storage.sum),
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxSummary {
    pub users: usize,
    pub with_delegates: usize,
    pub with_forwarding: usize,
    pub with_imap: usize,
    pub with_pop: usize,
}

impl MailboxSummary {
    pub fn from_rows(rows: &[MailboxRow]) -> Self {
        Self {
            users: rows.len(),
            with_delegates: rows.iter().filter(|r| r.has_delegates).count(),
            with_forwarding: rows.iter().filter(|r| r.has_forwarding).count(),
            with_imap: rows.iter().filter(|r| r.has_imap_access).count(),
            with_pop: rows.iter().filter(|r| r.has_pop_access).count(),
        }
    }

    pub fn print(&self) {
        if self.users == 0 {
            ui::warn("No data collected");
            return;
        }
        let line = |n: usize| format!("{} ({})", n, ui::percent(n, self.users));

        ui::header("Mailbox Summary");
        ui::kv("Total users processed", &self.users.to_string());
        ui::kv("Users with delegates", &line(self.with_delegates));
        ui::kv("Users with forwarding", &line(self.with_forwarding));
        ui::kv("Users with IMAP access", &line(self.with_imap));
        ui::kv("Users with POP access", &line(self.with_pop));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usagekit::ResolvedMetrics;

    fn usage(gmail_mb: f64, drive_mb: f64, exchanged: u64, items: u64) -> UsageRow {
        let metrics = ResolvedMetrics {
            gmail_storage_mb: gmail_mb,
            drive_storage_mb: drive_mb,
            total_storage_mb: gmail_mb + drive_mb,
            gmail_emails_exchanged: exchanged,
            drive_item_count: items,
            has_gmail_data: gmail_mb > 0.0 || exchanged > 0,
            has_drive_data: drive_mb > 0.0 || items > 0,
            ..Default::default()
        };
        UsageRow::new("u@example.com", &metrics)
    }

    #[test]
    fn test_column_mean_includes_zeros() {
        let col = Column::of([0.0, 2.0, 4.0]);
        assert_eq!(col.positive, 2);
        assert_eq!(col.sum, 6.0);
        assert_eq!(col.mean, 2.0);
        assert_eq!(col.max, 4.0);
    }

    #[test]
    fn test_column_empty() {
        assert_eq!(Column::of(std::iter::empty()), Column::default());
    }

    #[test]
    fn test_usage_summary() {
        let rows = vec![usage(1024.0, 0.0, 12, 0), usage(0.0, 2048.0, 0, 5)];
        let summary = UsageSummary::from_rows(&rows);
        assert_eq!(summary.users, 2);
        assert_eq!(summary.with_gmail_data, 1);
        assert_eq!(summary.with_drive_data, 1);
        assert_eq!(summary.gmail_storage.sum, 1024.0);
        assert_eq!(summary.emails_exchanged.mean, 6.0);
        assert_eq!(summary.drive_items.max, 5.0);
        assert_eq!(summary.total_storage.sum, 3072.0);
        assert_eq!(gb(summary.total_storage.sum), "3.00");
    }

    #[test]
    fn test_mailbox_summary() {
        let rows = vec![
            MailboxRow {
                has_delegates: true,
                has_imap_access: true,
                ..Default::default()
            },
            MailboxRow {
                has_forwarding: true,
                has_imap_access: true,
                ..Default::default()
            },
        ];
        let summary = MailboxSummary::from_rows(&rows);
        assert_eq!(
            summary,
            MailboxSummary {
                users: 2,
                with_delegates: 1,
                with_forwarding: 1,
                with_imap: 2,
                with_pop: 0,
            }
        );
    }
}
