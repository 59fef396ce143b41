use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a video and fetch its dubbed version
    Dub {
        /// Input video file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Target language for the dubbed audio (defaults to the configured one)
        #[arg(short, long)]
        target_lang: Option<String>,

        /// Where to save the dubbed video
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the backend base URL
        #[arg(long)]
        backend_url: Option<String>,
    },

    /// List the target languages on offer
    Languages,

    /// Check that the dubbing backend is reachable
    Check {
        /// Override the backend base URL
        #[arg(long)]
        backend_url: Option<String>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "config.toml")]
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dub() {
        let args = Args::try_parse_from([
            "dubclient", "-v", "dub", "-i", "clip.mp4", "-t", "pt-BR & more", "--backend-url", "http://dub:8000",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Commands::Dub { input, target_lang, output, backend_url } => {
                assert_eq!(input, Some(PathBuf::from("clip.mp4")));
                assert_eq!(target_lang.as_deref(), Some("pt-BR & more"));
                assert!(output.is_none());
                assert_eq!(backend_url.as_deref(), Some("http://dub:8000"));
            }
            _ => panic!("expected dub"),
        }
    }

    #[test]
    fn test_dub_input_is_optional() {
        let args = Args::try_parse_from(["dubclient", "dub"]).unwrap();
        assert!(matches!(args.command, Commands::Dub { input: None, .. }));
    }
}
