/*!
 * SRTF Simulator - Main Entry Point
 *
 * Seeds a demo workload, starts the scheduler and reads operator commands
 * from stdin. Pass `--no-demo` to start with an empty, stopped scheduler.
 */

use srtf_sim::console::{Command, ReportView, SnapshotView, HELP};
use srtf_sim::{init_tracing, Process, Scheduler, SchedulerConfig, SchedulerTask, SimTime};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SchedulerConfig::from_env_interactive()?;
    init_tracing(config.verbose);

    let demo = !std::env::args().any(|a| a == "--no-demo");
    let scheduler = Scheduler::new(config);
    let mut task: Option<SchedulerTask> = None;

    if demo {
        info!("Seeding demo workload");
        for (name, burst) in [("P1", 4), ("P2", 3), ("P3", 5)] {
            scheduler.add(Process::new(name, SimTime::from_units(burst)))?;
        }
        task = Some(scheduler.start()?);
        spawn_delayed_add(&scheduler, "P4", 1, 1);
        spawn_delayed_add(&scheduler, "P5", 1, 5);
    }

    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Start => match scheduler.start() {
                Ok(started) => task = Some(started),
                Err(e) => println!("{}", e),
            },
            Command::Add { name, burst } => {
                if let Err(e) = scheduler.add(Process::new(name, burst)) {
                    println!("{}", e);
                }
            }
            Command::Stat => match scheduler.report() {
                Ok(report) => println!("{}", ReportView(&report)),
                Err(e) => println!("{}", e),
            },
            Command::Processes => println!("{}", SnapshotView(&scheduler.snapshot())),
            Command::Clear => print!("\x1B[2J\x1B[1;1H"),
            Command::Help => println!("{}", HELP),
            Command::Close => match scheduler.close() {
                Ok(()) => {
                    if let Some(task) = task.take() {
                        task.shutdown().await?;
                    }
                    return Ok(());
                }
                Err(e) => println!("{}", e),
            },
        }
    }

    // stdin closed: let queued work drain, then print the final figures
    if let Some(task) = task.take() {
        task.shutdown().await?;
    } else if let Err(e) = scheduler.close() {
        warn!(error = %e, "Close on exit refused");
    }
    match scheduler.report() {
        Ok(report) => println!("{}", ReportView(&report)),
        Err(e) => println!("{}", e),
    }
    Ok(())
}

/// Add a process after `after_units` of real time, as an operator would
fn spawn_delayed_add(scheduler: &Scheduler, name: &'static str, burst: u64, after_units: u64) {
    let scheduler = scheduler.clone();
    let delay = scheduler
        .config()
        .real_duration(SimTime::from_units(after_units));
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = scheduler.add(Process::new(name, SimTime::from_units(burst))) {
            warn!(error = %e, name, "Delayed add rejected");
        }
    });
}
