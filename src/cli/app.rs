//! CLI application logic

use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::application::engine::Engine;
use crate::application::ports::{AudioActivityProbe, HostChannel};
use crate::cli::presenter::Presenter;
use crate::cli::scenario::{load_scenario, Scenario};
use crate::domain::audio::{is_voip_device, AudioDevice, AudioPortType};
use crate::domain::config::ContinuityConfig;
use crate::domain::recording::RecorderState;
use crate::infrastructure::host_bridge::{HostCommand, HostEndpoint, MpscHostChannel};
use crate::infrastructure::scripted::{
    ScriptedAudioMonitor, ScriptedTelephonyMonitor, TimelineAudioProbe,
};

/// Exit code for success
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for runtime errors
pub const EXIT_ERROR: u8 = 1;
/// Exit code for usage errors (bad arguments or scenario files)
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Timing overrides taken from the command line
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulateOverrides {
    pub settle_ms: Option<u64>,
    pub backoff_ms: Option<u64>,
    pub max_checks: Option<u32>,
}

impl SimulateOverrides {
    fn into_config(self) -> ContinuityConfig {
        ContinuityConfig {
            settle_delay_ms: self.settle_ms,
            retry_backoff_ms: self.backoff_ms,
            max_audio_checks: self.max_checks,
            ..Default::default()
        }
    }
}

/// One pause or resume command with its offset from simulation start
#[derive(Debug, Clone, Serialize)]
struct CommandRecord {
    at_ms: u64,
    command: String,
}

/// What the simulation produced, for the JSON output mode
#[derive(Debug, Serialize)]
struct SimulationSummary {
    final_state: RecorderState,
    commands: Vec<CommandRecord>,
}

/// Replay a scenario file against the continuity engine and report the
/// commands it issued.
pub async fn run_simulation(path: &Path, json: bool, overrides: SimulateOverrides) -> ExitCode {
    let presenter = Presenter::new();

    let scenario = match load_scenario(path) {
        Ok(scenario) => scenario,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    // Precedence: command line > scenario file > defaults
    let config = ContinuityConfig::defaults()
        .merge(scenario.config.clone())
        .merge(overrides.into_config());

    match simulate(&scenario, &config, !json).await {
        Ok(summary) => {
            if json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(text) => presenter.output(&text),
                    Err(e) => {
                        presenter.error(&format!("Failed to serialize summary: {}", e));
                        return ExitCode::from(EXIT_ERROR);
                    }
                }
            } else {
                presenter.success(&format!(
                    "simulation complete, recorder is {}",
                    summary.final_state
                ));
                if summary.commands.is_empty() {
                    presenter.info("no commands issued");
                } else {
                    for record in &summary.commands {
                        presenter.output(&format!("{:>6} ms  {}", record.at_ms, record.command));
                    }
                }
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn simulate(
    scenario: &Scenario,
    config: &ContinuityConfig,
    echo: bool,
) -> Result<SimulationSummary, String> {
    let (channel, endpoint) = MpscHostChannel::new(config.host_query_timeout());
    let host: Arc<dyn HostChannel> = Arc::new(channel);
    let probe: Arc<dyn AudioActivityProbe> =
        Arc::new(TimelineAudioProbe::new(scenario.activity_timeline()));
    let telephony = ScriptedTelephonyMonitor::new(scenario.call_script());
    let audio = ScriptedAudioMonitor::new(scenario.audio_script());

    let (engine, handle) = Engine::start(
        config.clone(),
        scenario.initial_state,
        &telephony,
        &audio,
        probe,
        host,
    )
    .map_err(|e| e.to_string())?;

    let state = Arc::new(Mutex::new(scenario.initial_state));
    let log = Arc::new(Mutex::new(Vec::new()));
    let host_task = tokio::spawn(run_host(
        endpoint,
        Arc::clone(&state),
        Arc::clone(&log),
        Instant::now(),
        echo,
    ));
    let engine_task = tokio::spawn(engine.run());

    tokio::time::sleep(scenario.horizon(config)).await;
    handle.shutdown();
    engine_task.await.map_err(|e| e.to_string())?;

    // The command channel closes once the engine and its query tasks are
    // gone; give stragglers one query timeout to wind down.
    let _ = tokio::time::timeout(
        config.host_query_timeout() + Duration::from_secs(1),
        host_task,
    )
    .await;

    let final_state = *state.lock().unwrap_or_else(|e| e.into_inner());
    let commands = log.lock().unwrap_or_else(|e| e.into_inner()).clone();
    Ok(SimulationSummary {
        final_state,
        commands,
    })
}

/// The simulated host: applies pause/resume commands to a tracked recorder
/// state and answers state queries from it.
async fn run_host(
    mut endpoint: HostEndpoint,
    state: Arc<Mutex<RecorderState>>,
    log: Arc<Mutex<Vec<CommandRecord>>>,
    start: Instant,
    echo: bool,
) {
    let presenter = Presenter::new();
    loop {
        tokio::select! {
            command = endpoint.commands.recv() => {
                let Some(command) = command else { break };
                let at_ms = start.elapsed().as_millis() as u64;
                match command {
                    HostCommand::Pause => {
                        *state.lock().unwrap_or_else(|e| e.into_inner()) = RecorderState::Paused;
                        log.lock().unwrap_or_else(|e| e.into_inner()).push(CommandRecord {
                            at_ms,
                            command: "pause".to_string(),
                        });
                        if echo {
                            presenter.command(&format!("[{:>6} ms] pause", at_ms));
                        }
                    }
                    HostCommand::Resume => {
                        *state.lock().unwrap_or_else(|e| e.into_inner()) = RecorderState::Recording;
                        log.lock().unwrap_or_else(|e| e.into_inner()).push(CommandRecord {
                            at_ms,
                            command: "resume".to_string(),
                        });
                        if echo {
                            presenter.command(&format!("[{:>6} ms] resume", at_ms));
                        }
                    }
                    HostCommand::Debug(message) => {
                        if echo {
                            presenter.debug(&format!("[{:>6} ms] {}", at_ms, message));
                        }
                    }
                }
            }
            query = endpoint.queries.recv() => {
                let Some(query) = query else { break };
                let current = *state.lock().unwrap_or_else(|e| e.into_inner());
                let _ = query.reply.send(current);
            }
        }
    }
}

fn classify_verdict(port_type: &str, name: &str) -> Result<&'static str, String> {
    let port = port_type
        .parse::<AudioPortType>()
        .map_err(|e| e.to_string())?;
    let device = AudioDevice::new(name, port);
    Ok(if is_voip_device(&device) {
        "voip"
    } else {
        "not-voip"
    })
}

/// Classify a device description as VoIP or not
pub fn run_classify(port_type: &str, name: &str) -> ExitCode {
    let presenter = Presenter::new();
    match classify_verdict(port_type, name) {
        Ok(verdict) => {
            presenter.output(verdict);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(message) => {
            presenter.error(&message);
            ExitCode::from(EXIT_USAGE_ERROR)
        }
    }
}
