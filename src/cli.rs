use anyhow::{Context, Result, anyhow};
use log::info;
use pico_args::Arguments;
use std::{env, ffi::OsString, io, path::PathBuf};

use crate::config::{Mode, Overrides, Settings};
use crate::filter::{DeviceGeometry, EventFilter, FlexCrop, StrictCrop, ValidZone};
use crate::input::{self, TouchDevice};
use crate::output::MirrorSink;
use crate::session::{self, ForwardTo, PrintEvents};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains(["-h", "--help"]) {
        print_help();
        return Ok(());
    }

    let subcmd: Option<String> = pargs.subcommand()?;

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.opt_free_from_str()?;
            match topic {
                Some(t) => print_subcmd_help(&t),
                None => print_help(),
            }
            Ok(())
        }

        Some("run") => {
            let settings = settings_from(&mut pargs)?;
            finish(pargs)?;
            crop(settings)
        }

        Some("print") => {
            let path = device_from(&mut pargs)?;
            finish(pargs)?;
            print_events(&path)
        }

        Some("info") => {
            let path = device_from(&mut pargs)?;
            finish(pargs)?;
            let dev = TouchDevice::open(&path)?;
            print_json(&input::describe(dev.device()));
            Ok(())
        }

        Some("list") => {
            finish(pargs)?;
            let devices = input::discover_multitouch();
            if devices.is_empty() {
                println!("no multitouch devices found (are you in the 'input' group?)");
            }
            for d in devices {
                println!("{}\t{}", d.path, d.name);
            }
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

/// Layers defaults, config file and flags, then validates.
fn settings_from(pargs: &mut Arguments) -> Result<Settings> {
    let config: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
    let overrides = Overrides {
        device: pargs.opt_value_from_str(["-d", "--device"])?,
        mode: pargs.opt_value_from_str(["-m", "--mode"])?,
        left: pargs.opt_value_from_str(["-l", "--left"])?,
        right: pargs.opt_value_from_str(["-r", "--right"])?,
        top: pargs.opt_value_from_str(["-t", "--top"])?,
        bottom: pargs.opt_value_from_str(["-b", "--bottom"])?,
    };

    let mut settings = Settings::load(config.as_deref())?;
    settings.apply(overrides);
    settings.validate()?;
    Ok(settings)
}

/// Device path for the read-only commands. `-d` skips the config file
/// entirely; without it only the file's `device` is consulted, so borders
/// are neither needed nor validated.
fn device_from(pargs: &mut Arguments) -> Result<String> {
    let config: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
    if let Some(device) = pargs.opt_value_from_str(["-d", "--device"])? {
        return Ok(device);
    }
    let settings = Settings::load(config.as_deref())?;
    Ok(device_path(&settings)?.to_string())
}

fn finish(pargs: Arguments) -> Result<()> {
    let rest: Vec<OsString> = pargs.finish();
    if !rest.is_empty() {
        return Err(anyhow!("unexpected arguments: {rest:?}"));
    }
    Ok(())
}

fn device_path(settings: &Settings) -> Result<&str> {
    settings
        .device
        .as_deref()
        .ok_or_else(|| anyhow!("no device given; pass -d /dev/input/eventN (see `touchcrop list`)"))
}

fn crop(settings: Settings) -> Result<()> {
    let mut dev = TouchDevice::open(device_path(&settings)?)?;
    let geometry = dev
        .geometry()
        .with_context(|| format!("cannot crop '{}'", dev.name()))?;
    let sink = MirrorSink::create_from(dev.device())?;

    info!(
        "cropping '{}' in {} mode: x=[{}, {}] y=[{}, {}] slots 0..={}",
        dev.name(),
        settings.mode,
        geometry.x.min,
        geometry.x.max,
        geometry.y.min,
        geometry.y.max,
        geometry.max_slot
    );

    match settings.mode {
        Mode::Strict => {
            let filter = StrictCrop::new(&geometry, settings.border);
            log_zone(filter.zone());
            forward(&mut dev, sink, filter)
        }
        Mode::Flex => {
            let filter = FlexCrop::new(&geometry, settings.border);
            log_zone(filter.zone());
            info!(
                "border touches pass within {:.0} units of another finger",
                proximity_radius(&geometry)
            );
            forward(&mut dev, sink, filter)
        }
    }
}

fn forward<F: EventFilter>(dev: &mut TouchDevice, sink: MirrorSink, filter: F) -> Result<()> {
    let mut handler = ForwardTo::new(sink, filter);
    session::run_event_loop(dev, &mut handler)?;
    Ok(())
}

fn log_zone(zone: &ValidZone) {
    info!("valid zone: {zone}");
}

fn proximity_radius(geometry: &DeviceGeometry) -> f64 {
    (geometry.diagonal_sq() as f64).sqrt() / 4.0
}

fn print_events(path: &str) -> Result<()> {
    let mut dev = TouchDevice::open(path)?;
    print_json(&input::describe(dev.device()));
    let stdout = io::stdout();
    let mut printer = PrintEvents::new(stdout.lock());
    session::run_event_loop(&mut dev, &mut printer)?;
    Ok(())
}

fn print_help() {
    println!(
        r#"touchcrop: crop the edges off a multitouch trackpad

USAGE:
  touchcrop help [command]         Show general or command-specific help
  touchcrop run -d <device> [opts] Grab <device> and re-emit it cropped
  touchcrop print -d <device>      Dump capabilities, then print every event
  touchcrop info -d <device>       Dump capabilities as JSON
  touchcrop list                   List multitouch devices

OPTIONS (run):
  -m, --mode <flex|strict>   flex lets gestures reach into the border (default flex)
  -l, --left <N>             Percent cropped from the left   (default 10)
  -r, --right <N>            Percent cropped from the right  (default 10)
  -t, --top <N>              Percent cropped from the top    (default 0)
  -b, --bottom <N>           Percent cropped from the bottom (default 15)
      --config <path>        Settings file (default ~/.config/touchcrop/config.toml)

TIPS:
  - Needs read access to /dev/input/event* and write access to /dev/uinput
  - Log level: RUST_LOG=debug touchcrop run ...
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: touchcrop run -d <device> [-m flex|strict] [-l N] [-r N] [-t N] [-b N] [--config P]\n\
             Grabs the device exclusively and forwards it through a virtual copy,\n\
             muting touches in the cropped border."
        ),
        "print" => println!(
            "usage: touchcrop print -d <device>\nPrints device capabilities, then every event. Does not grab."
        ),
        "info" => println!("usage: touchcrop info -d <device>\nPrints device capabilities as JSON."),
        "list" => println!("usage: touchcrop list\nLists multitouch devices under /dev/input."),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_json(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Arguments {
        Arguments::from_vec(list.iter().map(OsString::from).collect())
    }

    #[test]
    fn explicit_device_never_reads_the_config_file() {
        let mut pargs = args(&["--config", "/nonexistent/touchcrop.toml", "-d", "/dev/input/event5"]);
        assert_eq!(device_from(&mut pargs).unwrap(), "/dev/input/event5");
        assert!(finish(pargs).is_ok());
    }

    #[test]
    fn device_lookup_falls_back_to_the_config_file() {
        let mut pargs = args(&["--config", "/nonexistent/touchcrop.toml"]);
        assert!(device_from(&mut pargs).is_err());
    }

    #[test]
    fn crop_flags_are_left_over_for_read_only_commands() {
        let mut pargs = args(&["-d", "/dev/input/event5", "-l", "500"]);
        assert!(device_from(&mut pargs).is_ok());
        assert!(finish(pargs).is_err());
    }
}
