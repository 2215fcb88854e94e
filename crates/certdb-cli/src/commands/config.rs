use anyhow::Context;
use certdb_config::CertdbConfig;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;

/// Handle `certdb config`. Prints TOML unless `--format table` or `raw` is given.
pub fn handle(config: &CertdbConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    match flags.format {
        OutputFormat::Json => {
            let rendered =
                toml::to_string_pretty(config).context("failed to render configuration as TOML")?;
            print!("{rendered}");
            Ok(())
        }
        format => output(config, format),
    }
}

#[cfg(test)]
mod tests {
    use certdb_config::CertdbConfig;

    #[test]
    fn default_config_round_trips_through_toml() {
        let rendered = toml::to_string_pretty(&CertdbConfig::default()).unwrap();
        assert!(rendered.contains("[server]"));
        assert!(rendered.contains("[[run.tests]]"));

        let parsed: CertdbConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.run.tests, CertdbConfig::default().run.tests);
        assert_eq!(parsed.server.bind, "127.0.0.1:8001");
    }
}
