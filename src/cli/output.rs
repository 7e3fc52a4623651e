//! Table rendering for `users` / `logs` / `logs-all`.

use prettytable::{Table, row};

use crate::zk::{Attendance, FingerTemplate, User};

pub fn print_users(users: &[User]) {
    let mut table = Table::new();
    table.add_row(row!["UID", "User ID", "Name", "Privilege", "Group", "Card"]);
    for user in users {
        table.add_row(row![
            user.uid,
            user.user_id,
            user.name,
            user.privilege,
            user.group_id,
            user.card
        ]);
    }
    table.printstd();
}

pub fn print_attendance(records: &[Attendance]) {
    let mut table = Table::new();
    table.add_row(row!["UID", "User ID", "Timestamp", "Status", "Punch"]);
    for record in records {
        table.add_row(row![
            record.uid,
            record.user_id,
            record.timestamp,
            record.status,
            record.punch
        ]);
    }
    table.printstd();
}

pub fn print_templates(templates: &[FingerTemplate]) {
    let mut table = Table::new();
    table.add_row(row!["UID", "Finger", "Valid", "Bytes"]);
    for template in templates {
        table.add_row(row![
            template.uid,
            template.finger_id,
            template.valid,
            template.template_bytes.len()
        ]);
    }
    table.printstd();
}
