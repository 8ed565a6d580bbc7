use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::drift::PLATE_SCALE_ARCSEC_PER_PIXEL;
use crate::report::DEFAULT_CSV_FILE;
use crate::wcs::DEFAULT_REFERENCE_PIXEL;

#[derive(Parser)]
#[command(name = "seestar-drift")]
#[command(about = "Measure field drift across a sequence of plate-solved Seestar FITS files", long_about = None)]
pub struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute drift for FITS files given in chronological order
    Analyze {
        /// FITS files in chronological order, or directories (files sorted by name)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// CSV file to write
        #[arg(short, long, default_value = DEFAULT_CSV_FILE)]
        output: PathBuf,

        /// Console output format (table, csv, json, none)
        #[arg(short, long, default_value = "none")]
        format: String,

        /// Plate scale in arcseconds per pixel
        #[arg(long, default_value_t = PLATE_SCALE_ARCSEC_PER_PIXEL)]
        plate_scale: f64,

        #[command(flatten)]
        reference: ReferencePixelOptions,

        /// Directory for the PNG charts (defaults to the CSV directory)
        #[arg(long)]
        plot_dir: Option<PathBuf>,

        /// Skip rendering the PNG charts
        #[arg(long)]
        no_plots: bool,
    },

    /// Show the sky position of the reference pixel for a single FITS file
    Inspect {
        /// FITS file to read
        path: PathBuf,

        #[command(flatten)]
        reference: ReferencePixelOptions,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[derive(Parser, Debug, Clone, Copy)]
pub struct ReferencePixelOptions {
    /// Reference pixel X (0-based)
    #[arg(long, default_value_t = DEFAULT_REFERENCE_PIXEL.0)]
    pub ref_x: f64,

    /// Reference pixel Y (0-based)
    #[arg(long, default_value_t = DEFAULT_REFERENCE_PIXEL.1)]
    pub ref_y: f64,
}

impl ReferencePixelOptions {
    pub fn pixel(&self) -> (f64, f64) {
        (self.ref_x, self.ref_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::parse_from(["seestar-drift", "analyze", "a.fit", "b.fit"]);
        assert!(!cli.verbose);
        match cli.command {
            Commands::Analyze {
                paths,
                output,
                format,
                plate_scale,
                reference,
                plot_dir,
                no_plots,
            } => {
                assert_eq!(paths, vec![PathBuf::from("a.fit"), PathBuf::from("b.fit")]);
                assert_eq!(output, PathBuf::from("object_coordinates.csv"));
                assert_eq!(format, "none");
                assert_eq!(plate_scale, 2.37);
                assert_eq!(reference.pixel(), (540.0, 960.0));
                assert!(plot_dir.is_none());
                assert!(!no_plots);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_analyze_overrides() {
        let cli = Cli::parse_from([
            "seestar-drift",
            "-v",
            "analyze",
            "lights/",
            "--plate-scale",
            "3.1",
            "--ref-x",
            "100",
            "--ref-y",
            "200.5",
            "--no-plots",
            "-f",
            "json",
        ]);
        assert!(cli.verbose);
        let Commands::Analyze {
            plate_scale,
            reference,
            no_plots,
            format,
            ..
        } = cli.command
        else {
            panic!("expected analyze");
        };
        assert_eq!(plate_scale, 3.1);
        assert_eq!(reference.pixel(), (100.0, 200.5));
        assert!(no_plots);
        assert_eq!(format, "json");
    }

    #[test]
    fn test_analyze_requires_paths() {
        assert!(Cli::try_parse_from(["seestar-drift", "analyze"]).is_err());
    }

    #[test]
    fn test_inspect() {
        let cli = Cli::parse_from(["seestar-drift", "inspect", "frame.fit", "--format", "json"]);
        let Commands::Inspect { path, format, .. } = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(path, PathBuf::from("frame.fit"));
        assert_eq!(format, "json");
    }
}
