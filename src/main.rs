pub(crate) mod commands;
pub(crate) mod composer;
pub(crate) mod config;
pub(crate) mod controller;
pub(crate) mod effects;
pub(crate) mod framesink;
pub(crate) mod intervaltimer;
pub(crate) mod mqtt;
pub(crate) mod olaoutput;
pub(crate) mod renderloop;
pub(crate) mod scheduler;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use clap::Parser;

use crate::composer::PixelComposer;
use crate::config::Config;
use crate::controller::{LightController, SharedController};
use crate::framesink::FrameWriter;
use crate::mqtt::MqttClient;
use crate::olaoutput::OlaOutput;
use crate::renderloop::RenderLoop;

#[derive(Parser)]
struct Cli {
    /// The configuration file
    #[arg(short, long, value_name = "FILE", default_value = "lichtband.toml")]
    config: PathBuf,

    /// Overrides the number of pixels on the strip
    #[arg(short, long, value_name = "COUNT")]
    pixels: Option<usize>,
}

fn spawn<F>(name: &str, f: F) -> Result<thread::JoinHandle<()>, String>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(f)
        .map_err(|err| format!("Failed to create thread {name}: {err}"))
}

fn run(args: Cli) -> Result<(), String> {
    let mut config = Config::load(&args.config)?;
    if let Some(pixels) = args.pixels {
        config.pixel_count = pixels;
        config.validate()?;
    }
    log::info!(
        "Driving {} pixels every {} ms",
        config.pixel_count,
        config.tick_ms
    );

    let ola = OlaOutput::new(config.output.ola_addr, config.output.universe)?;
    let (frames, frame_receiver) = framesink::mailbox();
    let mut writer = FrameWriter::new(frame_receiver, ola, config.tick_period());

    let composer = PixelComposer::new(config.pixel_count, frames.clone());
    let controller = SharedController::new(LightController::new(
        composer,
        config.brightness,
        config.tick_period(),
    )?);

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .map_err(|err| format!("Cannot install signal handler: {err}"))?;

    let writer_thread = spawn("FrameWriter", move || writer.run())?;

    let render_controller = controller.clone();
    spawn("Render", move || {
        RenderLoop::new(render_controller).run();
    })?;

    let mqtt_client = MqttClient::new(&config.mqtt, controller.clone())?;
    spawn("MQTT", move || mqtt_client.run())?;

    if shutdown_rx.recv().is_ok() {
        log::info!("Shutting down");
    }

    controller.lock().kill();
    frames.close();
    if writer_thread.join().is_err() {
        log::error!("Frame writer panicked");
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
