use std::path::PathBuf;

use clap::Parser;

use crate::infrastructure::settings::AppSettings;

#[derive(Parser, Debug)]
#[command(
    name = "sheetforge",
    version,
    about = "Convert Fantasy Grounds character sheets to JSON"
)]
pub struct Args {
    /// Character sheet XML export
    #[arg(required_unless_present = "list_systems")]
    pub input: Option<PathBuf>,

    /// Output JSON file (defaults to <output dir>/<input stem>.json)
    pub output: Option<PathBuf>,

    /// Extraction rule file (YAML)
    #[arg(short, long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Game system used for enrichment ("none" disables it)
    #[arg(short, long, value_name = "SYSTEM")]
    pub enricher: Option<String>,

    /// List the available game systems, then exit
    #[arg(long)]
    pub list_systems: bool,
}

impl Args {
    /// Apply command line overrides on top of environment settings.
    pub fn apply(&self, mut settings: AppSettings) -> AppSettings {
        if let Some(rules) = &self.rules {
            settings.rules_path = rules.clone();
        }
        if let Some(enricher) = &self.enricher {
            settings.enricher = enricher.clone();
        }
        settings
    }

    /// Output path: explicit argument, else derived from the input name.
    pub fn output_path(&self, settings: &AppSettings) -> Option<PathBuf> {
        self.output.clone().or_else(|| {
            self.input
                .as_deref()
                .map(|input| settings.output_path_for(input))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_input_and_output() {
        let args = Args::try_parse_from(["sheetforge", "rook.xml", "out/rook.json"]).expect("parses");
        assert_eq!(args.input, Some(PathBuf::from("rook.xml")));
        assert_eq!(
            args.output_path(&AppSettings::default()),
            Some(PathBuf::from("out/rook.json"))
        );
    }

    #[test]
    fn output_defaults_to_settings_dir() {
        let args = Args::try_parse_from(["sheetforge", "sheets/rook.xml"]).expect("parses");
        assert_eq!(
            args.output_path(&AppSettings::default()),
            Some(PathBuf::from("output").join("rook.json"))
        );
    }

    #[test]
    fn flags_override_settings() {
        let args = Args::try_parse_from(["sheetforge", "rook.xml", "-r", "custom.yaml", "--enricher", "none"])
            .expect("parses");
        let settings = args.apply(AppSettings::default());
        assert_eq!(settings.rules_path, PathBuf::from("custom.yaml"));
        assert_eq!(settings.enricher, "none");
        assert_eq!(settings.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn input_required_unless_listing_systems() {
        assert!(Args::try_parse_from(["sheetforge"]).is_err());
        let args = Args::try_parse_from(["sheetforge", "--list-systems"]).expect("parses");
        assert!(args.list_systems);
        assert_eq!(args.input, None);
    }
}
