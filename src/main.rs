use clap::{ Arg, App };
use tracing_subscriber::EnvFilter;

use std::error::Error;
use std::fs;
use std::path::{ Path, PathBuf };

use lpr_plate::{ utils, Lpr, PipelineConfig };


fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let matches = App::new("lpr-plate")
                    .version("0.1.0")
                    .about("Locate a license plate, read it and name its issuing region")
                    .arg(Arg::with_name("INPUT")
                        .help("jpeg/png image, or a directory of them")
                        .required(true)
                        .index(1))
                    .arg(Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .help("save the annotated image here (single image only)"))
                    .arg(Arg::with_name("config")
                        .short("c")
                        .long("config")
                        .takes_value(true)
                        .help("json pipeline config"))
                    .arg(Arg::with_name("tesseract")
                        .long("tesseract")
                        .takes_value(true)
                        .help("tesseract binary, overrides TESSERACT_CMD"))
                    .arg(Arg::with_name("lang")
                        .long("lang")
                        .takes_value(true)
                        .help("tesseract language data, default eng"))
                    .arg(Arg::with_name("font")
                        .long("font")
                        .takes_value(true)
                        .help("ttf font for the region label overlay, default is the built-in DejaVu Sans"))
                    .arg(Arg::with_name("display")
                        .long("display")
                        .help("show the annotated image in a window (needs the display feature)"))
                    .get_matches();
    let input = matches.value_of("INPUT").ok_or("image is required")?;

    let mut config = match matches.value_of("config") {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(tesseract) = matches.value_of("tesseract") {
        config.tesseract.executable = Some(PathBuf::from(tesseract));
    }
    if let Some(lang) = matches.value_of("lang") {
        config.tesseract.language = lang.to_string();
    }
    if let Some(font) = matches.value_of("font") {
        config.font_path = Some(PathBuf::from(font));
    }

    let lpr = Lpr::from_config(&config)?;
    let input = Path::new(input);
    if input.is_dir() {
        return recognize_dir(&lpr, input);
    }

    let res = lpr.analyze_path(input)?;
    println!("{}", res.summary());
    if let Some(output) = matches.value_of("output") {
        res.annotated.save(output)?;
    }
    if matches.is_present("display") {
        display(&res.annotated);
    }
    Ok(())
}

fn recognize_dir(lpr: &Lpr, dir: &Path) -> Result<(), Box<dyn Error>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| utils::is_supported_image(path))
        .collect();
    paths.sort();

    let mut detected = 0;
    for path in &paths {
        match lpr.analyze_path(path) {
            Ok(res) => {
                if res.is_detected() {
                    detected += 1;
                }
                println!("{}: {}", path.display(), res.summary());
            }
            Err(e) => eprintln!("{}: {}", path.display(), e),
        }
    }
    println!("total: {}, detected: {}", paths.len(), detected);
    Ok(())
}

#[cfg(feature = "display")]
fn display(img: &image::RgbImage) {
    let (width, height) = img.dimensions();
    imageproc::window::display_image("lpr-plate", img, width, height);
}

#[cfg(not(feature = "display"))]
fn display(_: &image::RgbImage) {
    eprintln!("built without the display feature");
}
