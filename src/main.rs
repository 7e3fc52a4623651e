//! `rbzk` — command-line client for ZKTeco attendance terminals.

use std::process::ExitCode;

use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use clap::Parser;

use rbzk::cli::{output, Cli, Command};
use rbzk::config::CliConfig;
use rbzk::zk::{self, ZkTeco};

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(if cli.overrides.verbose { tracing::Level::DEBUG.into() } else { tracing::Level::INFO.into() }),
        )
        .init();

    let verbose = cli.overrides.verbose;
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if verbose {
                eprintln!("error: {e:#}");
            } else {
                eprintln!("error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let path = CliConfig::resolve_path();

    match &cli.command {
        Command::Config => {
            let config = CliConfig::load_or_default(&path)?;
            println!("config path: {}", path.display());
            println!("{}", serde_yaml::to_string(&config)?);
            return Ok(());
        }
        Command::ConfigSet { key, value } => {
            let mut config = CliConfig::load_or_default(&path)?;
            config.set_key(key, value)?;
            config.save(&path)?;
            println!("set {key} = {value}");
            return Ok(());
        }
        Command::ConfigReset => {
            let config = CliConfig::default();
            config.save(&path)?;
            println!("config reset to defaults at {}", path.display());
            return Ok(());
        }
        _ => {}
    }

    let config = CliConfig::load_or_default(&path)?;
    let options = cli.overrides.apply(&config);
    let mut device = ZkTeco::new(options);
    device.connect()?;
    let result = dispatch(&mut device, cli.command);
    let _ = device.disconnect();
    result
}

fn dispatch(device: &mut ZkTeco, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Info => {
            let serial = device.get_option("~SerialNumber").unwrap_or_default();
            let firmware = device.get_option("~Platform").unwrap_or_default();
            let counts = device.device_counts();
            println!("serial number: {serial}");
            println!("platform: {firmware}");
            println!(
                "users: {}/{} fingers: {}/{} records: {}/{}",
                counts.users, counts.users_cap, counts.fingers, counts.fingers_cap, counts.records, counts.records_cap
            );
        }
        Command::Refresh => {
            device.refresh_data()?;
            println!("refreshed device caches");
        }
        Command::Users => {
            let users = device.get_users()?;
            output::print_users(&users);
        }
        Command::Logs {
            today,
            yesterday,
            week,
            month,
            start_date,
            end_date,
            limit,
        } => {
            let mut records = device.get_attendance_logs()?;
            if let Some((start, end)) = resolve_date_range(today, yesterday, week, month, start_date, end_date)? {
                records.retain(|r| r.timestamp.date() >= start && r.timestamp.date() <= end);
            }
            if let Some(limit) = limit {
                records.truncate(limit);
            }
            output::print_attendance(&records);
        }
        Command::LogsAll => {
            let records = device.get_attendance_logs()?;
            output::print_attendance(&records);
        }
        Command::ClearLogs => {
            device.clear_attendance()?;
            println!("attendance log cleared");
        }
        Command::Unlock { time } => {
            device.unlock(time)?;
            println!("door unlocked for {time} tenths of a second");
        }
        Command::DoorState => {
            let open = device.door_state()?;
            println!("door state: {}", if open { "open" } else { "closed" });
        }
        Command::WriteLcd { line, text } => {
            device.write_lcd(line, &text)?;
        }
        Command::ClearLcd => {
            device.clear_lcd()?;
        }
        Command::AddUser {
            uid,
            name,
            privilege,
            password,
            group_id,
            user_id,
            card,
        } => {
            let user = zk::User {
                uid,
                user_id,
                name,
                privilege,
                password,
                group_id,
                card,
            };
            let saved = device.set_user(user)?;
            println!("saved user uid={}", saved.uid);
        }
        Command::DeleteUser { uid } => {
            device.delete_user(uid)?;
            println!("deleted user uid={uid}");
        }
        Command::GetTemplates => {
            let templates = device.get_templates()?;
            output::print_templates(&templates);
        }
        Command::GetUserTemplate { uid, finger_id } => {
            let template = device.get_user_template(uid, finger_id)?;
            output::print_templates(&[template]);
        }
        Command::TestVoice { index } => {
            device.test_voice(index)?;
        }
        Command::EnableDevice => {
            device.enable_device()?;
        }
        Command::DisableDevice => {
            device.disable_device()?;
        }
        Command::Restart => {
            device.restart()?;
            println!("restart requested");
        }
        Command::Poweroff => {
            device.poweroff()?;
            println!("power-off requested");
        }
        Command::Config | Command::ConfigSet { .. } | Command::ConfigReset => unreachable!("handled before connect"),
    }
    Ok(())
}

fn resolve_date_range(
    today: bool,
    yesterday: bool,
    week: bool,
    month: bool,
    start_date: Option<String>,
    end_date: Option<String>,
) -> anyhow::Result<Option<(chrono::NaiveDate, chrono::NaiveDate)>> {
    let now = Local::now().date_naive();
    if today {
        return Ok(Some((now, now)));
    }
    if yesterday {
        let y = now - ChronoDuration::days(1);
        return Ok(Some((y, y)));
    }
    if week {
        return Ok(Some((now - ChronoDuration::days(6), now)));
    }
    if month {
        return Ok(Some((now - ChronoDuration::days(29), now)));
    }
    if start_date.is_some() || end_date.is_some() {
        let start = match start_date {
            Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")?,
            None => NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        };
        let end = match end_date {
            Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")?,
            None => now,
        };
        return Ok(Some((start, end)));
    }
    Ok(None)
}
