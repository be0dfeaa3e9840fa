use platecrafter::engine::{Operation, PlateEngine, Workflow};
use platecrafter::layout_io;
use platecrafter::plate_format::PlateFormat;
use platecrafter::render_plate::export_plate_svg;
use platecrafter::units::ConcentrationUnit;
use platecrafter::well_color::Theme;
use platecrafter::{checkerboard, PLATE_96};
use serde::Serialize;
use std::{env, fs};

const DEFAULT_LAYOUT_PATH: &str = ".platecrafter_layout.json";

#[derive(Serialize)]
struct LayoutSummary {
    well_count: usize,
    assigned_wells: usize,
    max_concentration_um: f64,
    compounds: Vec<String>,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  platecrafter_cli --version\n  \
  platecrafter_cli [--layout PATH] capabilities\n  \
  platecrafter_cli [--layout PATH] op '<operation-json>'\n  \
  platecrafter_cli [--layout PATH] workflow '<workflow-json>'\n  \
  platecrafter_cli [--layout PATH] summary\n  \
  platecrafter_cli [--layout PATH] export-csv OUTPUT.csv molar|mass\n  \
  platecrafter_cli [--layout PATH] render-svg OUTPUT.svg [molar|mass] [light|dark|publication]\n  \
  platecrafter_cli protocol '<checkerboard-request-json>'\n\n  \
  Tip: pass @file.json instead of inline JSON"
    );
}

fn load_json_arg(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix('@') {
        fs::read_to_string(path).map_err(|e| format!("Could not read JSON file '{path}': {e}"))
    } else {
        Ok(value.to_string())
    }
}

fn load_engine(format: &PlateFormat, path: &str) -> Result<PlateEngine, String> {
    if std::path::Path::new(path).exists() {
        let plate = layout_io::load_layout(format, path).map_err(|e| e.to_string())?;
        Ok(PlateEngine::from_plate(plate))
    } else {
        Ok(PlateEngine::new())
    }
}

fn save_engine(engine: &PlateEngine, path: &str) -> Result<(), String> {
    layout_io::save_layout(engine.plate(), path).map_err(|e| e.to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn parse_global_layout_arg(args: &[String]) -> (String, usize) {
    if args.len() >= 3 && args[1] == "--layout" {
        return (args[2].clone(), 3);
    }
    (DEFAULT_LAYOUT_PATH.to_string(), 1)
}

fn parse_unit(value: &str) -> Result<ConcentrationUnit, String> {
    match value {
        "molar" => Ok(ConcentrationUnit::Molar),
        "mass" => Ok(ConcentrationUnit::Mass),
        other => Err(format!("Unknown unit '{other}', expected 'molar' or 'mass'")),
    }
}

fn parse_theme(value: &str) -> Result<Theme, String> {
    match value {
        "light" => Ok(Theme::Light),
        "dark" => Ok(Theme::Dark),
        "publication" => Ok(Theme::Publication),
        other => Err(format!(
            "Unknown theme '{other}', expected 'light', 'dark' or 'publication'"
        )),
    }
}

fn summarize_layout(engine: &PlateEngine) -> LayoutSummary {
    let mut compounds: Vec<String> = engine
        .plate()
        .wells()
        .iter()
        .filter(|w| !w.compound.is_empty())
        .map(|w| w.compound.clone())
        .collect();
    compounds.sort();
    compounds.dedup();

    LayoutSummary {
        well_count: engine.format().well_count(),
        assigned_wells: engine.plate().assigned_count(),
        max_concentration_um: engine.plate().max_concentration(),
        compounds,
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        usage();
        return Err("Missing command".to_string());
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("platecrafter v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (layout_path, cmd_idx) = parse_global_layout_arg(&args);
    if args.len() <= cmd_idx {
        usage();
        return Err("Missing command".to_string());
    }

    let command = &args[cmd_idx];

    match command.as_str() {
        "capabilities" => {
            print_json(&PlateEngine::capabilities())?;
            Ok(())
        }
        "summary" => {
            let engine = load_engine(&PLATE_96, &layout_path)?;
            print_json(&summarize_layout(&engine))
        }
        "export-csv" => {
            if args.len() <= cmd_idx + 2 {
                usage();
                return Err("export-csv requires: OUTPUT.csv molar|mass".to_string());
            }
            let output = &args[cmd_idx + 1];
            let unit = parse_unit(&args[cmd_idx + 2])?;
            let engine = load_engine(&PLATE_96, &layout_path)?;
            let csv = layout_io::layout_to_csv(engine.plate(), unit).map_err(|e| e.to_string())?;
            fs::write(output, csv)
                .map_err(|e| format!("Could not write CSV output '{output}': {e}"))?;
            println!("Wrote layout CSV to '{output}'");
            Ok(())
        }
        "render-svg" => {
            if args.len() <= cmd_idx + 1 {
                usage();
                return Err("render-svg requires: OUTPUT.svg [molar|mass] [light|dark|publication]"
                    .to_string());
            }
            let output = &args[cmd_idx + 1];
            let unit = match args.get(cmd_idx + 2) {
                Some(value) => parse_unit(value)?,
                None => ConcentrationUnit::Molar,
            };
            let theme = match args.get(cmd_idx + 3) {
                Some(value) => parse_theme(value)?,
                None => Theme::Light,
            };

            let engine = load_engine(&PLATE_96, &layout_path)?;
            let svg = export_plate_svg(
                engine.format(),
                engine.plate(),
                unit,
                theme,
                engine.checkerboard(),
            );
            fs::write(output, svg)
                .map_err(|e| format!("Could not write SVG output '{output}': {e}"))?;
            println!("Wrote plate SVG to '{output}'");
            Ok(())
        }
        "protocol" => {
            if args.len() <= cmd_idx + 1 {
                usage();
                return Err("Missing checkerboard request JSON".to_string());
            }
            let json = load_json_arg(&args[cmd_idx + 1])?;
            let request: checkerboard::CheckerboardRequest = serde_json::from_str(&json)
                .map_err(|e| format!("Invalid checkerboard request JSON: {e}"))?;
            println!("{}", checkerboard::generate_protocol(&request));
            Ok(())
        }
        "op" => {
            if args.len() <= cmd_idx + 1 {
                usage();
                return Err("Missing operation JSON".to_string());
            }
            let json = load_json_arg(&args[cmd_idx + 1])?;
            let op: Operation =
                serde_json::from_str(&json).map_err(|e| format!("Invalid operation JSON: {e}"))?;

            let mut engine = load_engine(&PLATE_96, &layout_path)?;
            let result = engine.apply(op).map_err(|e| e.to_string())?;
            save_engine(&engine, &layout_path)?;
            print_json(&result)
        }
        "workflow" => {
            if args.len() <= cmd_idx + 1 {
                usage();
                return Err("Missing workflow JSON".to_string());
            }
            let json = load_json_arg(&args[cmd_idx + 1])?;
            let workflow: Workflow =
                serde_json::from_str(&json).map_err(|e| format!("Invalid workflow JSON: {e}"))?;

            let mut engine = load_engine(&PLATE_96, &layout_path)?;
            let results = engine.apply_workflow(workflow).map_err(|e| e.to_string())?;
            save_engine(&engine, &layout_path)?;
            print_json(&results)
        }
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}
