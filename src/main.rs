use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use varyui::client::{Backend, HttpBackend};
use varyui::logging::{info, obj, v_num, v_str, Domain};
use varyui::session::{GenerationOutcome, Session};
use varyui::settings::Settings;

fn print_usage() {
    eprintln!("Usage: varyui <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  source                      List the declared variables");
    eprintln!("  generate <n>                Generate n documents (1..=100)");
    eprintln!("  predict                     Show option probabilities");
    eprintln!("  files                       List the project files");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --set name=value            Constrain a variable (repeatable)");
    eprintln!("  --add                       Append to the previous results");
    eprintln!("  --filter                    Generate using the constraints");
    eprintln!("  --build <row>               Build the PDF of one generated row");
    eprintln!("  --build-config              Build a PDF from the constraints");
    eprintln!("  --out <file.pdf>            Where to write the built PDF");
    eprintln!();
    eprintln!("Environment: VARY_SERVER, VARY_MAX_PAGES, VARY_GENERATION_ROUTE,");
    eprintln!("             VARY_RETRIES, VARY_RETRY_BASE_MS, LOG_LEVEL, LOG_DIR");
}

#[derive(Debug, Default)]
struct Options {
    constraints: Vec<(String, String)>,
    add: bool,
    filter: bool,
    build_row: Option<usize>,
    build_config: bool,
    out: Option<PathBuf>,
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut opts = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--set" => {
                let pair = iter.next().ok_or_else(|| anyhow!("--set needs name=value"))?;
                let (name, value) = pair
                    .split_once('=')
                    .ok_or_else(|| anyhow!("--set needs name=value, got {}", pair))?;
                opts.constraints.push((name.trim().to_string(), value.to_string()));
            }
            "--add" => opts.add = true,
            "--filter" => opts.filter = true,
            "--build" => {
                let row = iter.next().ok_or_else(|| anyhow!("--build needs a row index"))?;
                opts.build_row = Some(row.parse()?);
            }
            "--build-config" => opts.build_config = true,
            "--out" => {
                let path = iter.next().ok_or_else(|| anyhow!("--out needs a path"))?;
                opts.out = Some(PathBuf::from(path));
            }
            other => bail!("unknown option: {}", other),
        }
    }
    Ok(opts)
}

async fn apply_constraints<B: Backend>(session: &mut Session<B>, opts: &Options) -> Result<()> {
    for (name, value) in &opts.constraints {
        if !session.constrain(name, value).await {
            bail!("cannot set {} = {}", name, value);
        }
    }
    Ok(())
}

fn print_probas<B: Backend>(session: &Session<B>) {
    let widgets = session
        .booleans()
        .iter()
        .chain(session.enums())
        .chain(session.groups());
    for widget in widgets {
        println!("{}", widget.name().unwrap_or("(choice)"));
        for entry in widget.options() {
            let marker = if entry.label == widget.selected().label { "*" } else { " " };
            let color = entry.color.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
            println!("  {} {:<24} {}", marker, entry.label, color);
        }
    }
    for number in session.numbers() {
        let state = match number.effective_value() {
            Some(v) => format!("{}", v),
            None => "off".to_string(),
        };
        let color = number.color().map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
        println!("{} [{} .. {}] = {} {}", number.name(), number.min(), number.max(), state, color);
    }
}

fn save_build<B: Backend>(session: &Session<B>, built: bool, opts: &Options) -> Result<()> {
    if !built {
        bail!("pdf build failed");
    }
    let out = opts.out.clone().unwrap_or_else(|| PathBuf::from("output.pdf"));
    if session.save_pdf(&out)? {
        println!("wrote {}", out.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let settings = Settings::from_env();
    info(
        Domain::System,
        "startup",
        obj(&[
            ("server", v_str(&settings.server)),
            ("max_pages", v_num(settings.max_pages.unwrap_or(0) as f64)),
        ]),
    );
    let backend = HttpBackend::new(&settings)?;
    let mut session = Session::new(backend, settings);

    let cmd = args[1].as_str();
    match cmd {
        "source" => {
            session.load_config_src().await?;
            print_probas(&session);
            println!("{} variables", session.variable_count());
        }
        "generate" => {
            let amount = args.get(2).cloned().unwrap_or_default();
            let opts = parse_options(args.get(3..).unwrap_or_default())?;
            session.load_config_src().await?;
            if opts.filter {
                session.toggle_filter();
            }
            apply_constraints(&mut session, &opts).await?;

            match session.generate(&amount, !opts.add).await {
                GenerationOutcome::Rejected(e) => bail!("{}", e),
                GenerationOutcome::Failed => bail!("generation failed"),
                GenerationOutcome::Completed { rows } => {
                    println!("{}", session.results().render());
                    println!("{} rows generated", rows);
                    if let Some(link) = session.status_link() {
                        println!("{}: {}{}", session.status(), session.settings().server, link);
                    }
                }
            }

            if let Some(row) = opts.build_row {
                let built = session.build_pdf(row).await;
                save_build(&session, built, &opts)?;
            } else if opts.build_config {
                let built = session.build_from_config().await;
                save_build(&session, built, &opts)?;
            }
        }
        "predict" => {
            let opts = parse_options(args.get(2..).unwrap_or_default())?;
            session.load_config_src().await?;
            // the server needs generated documents before it can predict
            if let GenerationOutcome::Completed { .. } = session.generate("10", true).await {
                apply_constraints(&mut session, &opts).await?;
                session.refresh_probas().await;
            }
            print_probas(&session);
            if opts.build_config {
                let built = session.build_from_config().await;
                save_build(&session, built, &opts)?;
            }
        }
        "files" => {
            let count = session.load_filenames().await?;
            for name in session.files().names() {
                println!("{}", name);
            }
            println!("{} files", count);
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
    }
    Ok(())
}
