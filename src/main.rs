//! Command line front end for the PSG engine.
//!
//! ```text
//! pico-psg render song.json -o song.wav
//! pico-psg play song.json            (feature "streaming")
//! pico-psg encode song.json -o song.psgq
//! pico-psg dump song.psgq
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pico_psg::driver::{WavConfig, WavDriver};
use pico_psg::engine::{Engine, EngineConfig, Pacing, Script, Sequencer};
use pico_psg::psg::Register;
use pico_psg::queue::encode_stream;

#[derive(Parser)]
#[command(name = "pico-psg")]
#[command(about = "Render, play and convert PSG command scripts")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a script to a WAV file
    Render {
        /// Script (.json) or packet stream
        script: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        /// Silence rendered after the last event (ms)
        #[arg(long, default_value_t = 500)]
        tail_ms: u32,
    },

    /// Play a script on the default audio device
    #[cfg(feature = "streaming")]
    Play {
        /// Script (.json) or packet stream
        script: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,

        /// Time to keep playing after the last event (ms)
        #[arg(long, default_value_t = 500)]
        tail_ms: u32,
    },

    /// Convert a JSON script to a binary packet stream
    Encode {
        /// JSON script
        script: PathBuf,

        /// Output packet stream
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the packets of a script or packet stream
    Dump {
        /// Script (.json) or packet stream
        script: PathBuf,

        /// Print as a JSON script instead
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct EngineArgs {
    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output sample rate (Hz)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Chip master clock (Hz)
    #[arg(long)]
    chip_clock: Option<u32>,
}

impl EngineArgs {
    /// Command line > config file > script > defaults
    fn resolve(&self, script: &Script) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => script.config.unwrap_or_default(),
        };
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(clock) = self.chip_clock {
            config.chip_clock = clock;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_script(path: &Path) -> Result<Script> {
    Script::load(path).with_context(|| format!("loading {}", path.display()))
}

fn render(script_path: &Path, output: &Path, engine: &EngineArgs, tail_ms: u32) -> Result<()> {
    let script = load_script(script_path)?;
    let config = engine.resolve(&script)?.with_pacing(Pacing::Freerun);
    info!(
        events = script.len(),
        duration_ms = script.duration_ms(),
        sample_rate = config.sample_rate,
        "rendering {}",
        script_path.display()
    );

    let (mut psg, mut core) = Engine::offline::<WavDriver>(config, WavConfig::new(output))?;
    let mut sequencer = Sequencer::new(&script, psg.now());
    let total_ms = script.duration_ms() + tail_ms;
    for _ in 0..total_ms {
        sequencer.pump(&mut psg);
        core.run_ms(1);
    }

    let registers = core.voices().registers();
    let stats = core.stats();
    let driver = core.shutdown();
    info!(
        frames = driver.frames(),
        applied = stats.applied,
        dropped = stats.dropped,
        "done"
    );
    for (addr, value) in registers.iter().enumerate() {
        if let Some(reg) = Register::from_addr(addr as u8) {
            info!("{reg}: 0x{value:02X}");
        }
    }
    if driver.faults() > 0 {
        bail!("{} samples could not be written", driver.faults());
    }
    Ok(())
}

#[cfg(feature = "streaming")]
fn play(script_path: &Path, engine: &EngineArgs, tail_ms: u32) -> Result<()> {
    use pico_psg::driver::{StreamConfig, StreamDriver};
    use std::thread;
    use std::time::Duration;

    let script = load_script(script_path)?;
    let config = engine.resolve(&script)?.with_pacing(Pacing::Realtime);
    let mut psg = pico_psg::launch::<StreamDriver>(config, StreamConfig::default())?;
    let mut sequencer = Sequencer::new(&script, psg.now());
    info!(events = script.len(), "playing {}", script_path.display());

    let end = script.duration_ms() + tail_ms;
    while !sequencer.is_finished() || sequencer.elapsed_ms() < end {
        sequencer.pump(&mut psg);
        thread::sleep(Duration::from_millis(5));
    }

    let stats = psg.stats();
    psg.stop()?;
    info!(applied = stats.applied, dropped = stats.dropped, "done");
    Ok(())
}

fn encode(script_path: &Path, output: &Path) -> Result<()> {
    let script = load_script(script_path)?;
    let packets = script.to_packets()?;
    fs::write(output, encode_stream(&packets))
        .with_context(|| format!("writing {}", output.display()))?;
    info!(packets = packets.len(), "wrote {}", output.display());
    Ok(())
}

fn dump(script_path: &Path, json: bool) -> Result<()> {
    let script = load_script(script_path)?;
    if json {
        println!("{}", script.to_json()?);
        return Ok(());
    }
    for packet in script.to_packets()? {
        println!("{packet}");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match &args.command {
        Commands::Render {
            script,
            output,
            engine,
            tail_ms,
        } => render(script, output, engine, *tail_ms),
        #[cfg(feature = "streaming")]
        Commands::Play {
            script,
            engine,
            tail_ms,
        } => play(script, engine, *tail_ms),
        Commands::Encode { script, output } => encode(script, output),
        Commands::Dump { script, json } => dump(script, *json),
    }
}
