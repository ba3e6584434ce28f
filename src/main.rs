//! Cardioid CLI - serve or render functional graphs of modular multiplication.

use anyhow::{Context, Result};
use cardioid::config::{CardioidConfig, LimitsConfig};
use cardioid::generators::{Canvas, Format, Generator};
use cardioid::orbit::generate;
use cardioid::server::{create_app, run_server, state::AppState};
use clap::{Parser, ValueEnum};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "cardioid")]
#[command(about = "Draw x -> x * mult mod m as a graph on a circle")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "cardioid.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Render a single diagram to a file
    Render {
        /// Modulus (number of nodes)
        #[arg(long = "mod")]
        modulus: u64,

        /// Multiplier
        #[arg(long)]
        mult: u64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "png")]
        format: FormatArg,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Width of the output
        #[arg(long)]
        width: Option<u32>,

        /// Height of the output
        #[arg(long)]
        height: Option<u32>,

        /// Never draw node labels
        #[arg(long)]
        no_labels: bool,

        /// Also save the diagram as JSON
        #[arg(long)]
        save_json: bool,
    },

    /// Render a gallery of well-known multipliers
    Showcase {
        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "png")]
        format: FormatArg,

        /// Width of the output
        #[arg(long)]
        width: Option<u32>,

        /// Height of the output
        #[arg(long)]
        height: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum, Debug)]
enum FormatArg {
    /// Raster image
    Png,
    /// Vector image
    Svg,
}

impl FormatArg {
    fn to_format(self) -> Format {
        match self {
            FormatArg::Png => Format::Png,
            FormatArg::Svg => Format::Svg,
        }
    }
}

/// `(mod, mult, name)` pairs whose envelopes have names.
const SHOWCASE: [(u64, u64, &str); 8] = [
    (200, 2, "cardioid"),
    (200, 3, "nephroid"),
    (200, 4, "three_cusps"),
    (200, 5, "four_cusps"),
    (200, 51, "rose"),
    (200, 99, "star"),
    (9, 2, "two_cycles"),
    (7, 3, "primitive_root"),
];

fn canvas_for(config: &CardioidConfig, width: Option<u32>, height: Option<u32>) -> Result<Canvas> {
    let mut render = config.render.clone();
    render.width = width.unwrap_or(render.width);
    render.height = height.unwrap_or(render.height);
    Ok(Canvas::from_config(&render)?)
}

fn write_diagram(
    generator: &dyn Generator,
    limits: &LimitsConfig,
    modulus: u64,
    multiplier: u64,
    path: &Path,
) -> Result<cardioid::Diagram> {
    limits.check(modulus)?;
    let diagram = generate(modulus, multiplier)?;
    let bytes = generator.generate(&diagram)?;
    fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(diagram)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cardioid=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = CardioidConfig::load(Path::new(&cli.config))?;

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let addr = config.server.addr();
            let state = AppState::new(config)?;
            run_server(create_app(state), addr).await?;
        }

        Commands::Render {
            modulus,
            mult,
            format,
            output,
            width,
            height,
            no_labels,
            save_json,
        } => {
            let mut canvas = canvas_for(&config, width, height)?;
            canvas.labels &= !no_labels;
            let generator = format.to_format().generator(canvas);

            let output_dir = PathBuf::from(&config.output.directory);
            fs::create_dir_all(&output_dir)?;
            let output_path = output.unwrap_or_else(|| {
                output_dir.join(format!(
                    "cardioid_{}_{}.{}",
                    modulus,
                    mult,
                    generator.extension()
                ))
            });

            info!("Rendering mod={} mult={} as {}", modulus, mult, generator.name());
            let diagram = write_diagram(generator.as_ref(), &config.limits, modulus, mult, &output_path)?;
            info!(
                "{} nodes, {} edges",
                diagram.graph.node_count(),
                diagram.graph.edge_count()
            );
            println!("Saved to {}", output_path.display());

            if save_json {
                let json_path = output_path.with_extension("json");
                fs::write(&json_path, serde_json::to_string_pretty(&diagram)?)?;
                println!("Saved diagram to {}", json_path.display());
            }
        }

        Commands::Showcase {
            output_dir,
            format,
            width,
            height,
        } => {
            let output_dir = output_dir
                .unwrap_or_else(|| PathBuf::from(&config.output.directory).join("showcase"));
            fs::create_dir_all(&output_dir)?;

            let generator = format.to_format().generator(canvas_for(&config, width, height)?);

            for (modulus, mult, name) in SHOWCASE {
                let filename = format!(
                    "{}_{}_{}.{}",
                    name,
                    modulus,
                    mult,
                    generator.extension()
                );
                write_diagram(generator.as_ref(), &config.limits, modulus, mult, &output_dir.join(&filename))?;
                println!("  Created {}", filename);
            }

            println!("Done! Showcase saved to {}", output_dir.display());
        }
    }

    Ok(())
}
