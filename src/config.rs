use anyhow::Context;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to a Postgres connection string")?;
        let max_connections = parse_max_connections(
            std::env::var("PRACTICE_COACH_MAX_CONNECTIONS").ok().as_deref(),
        )?;

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

fn parse_max_connections(raw: Option<&str>) -> anyhow::Result<u32> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(DEFAULT_MAX_CONNECTIONS),
        Some(value) => {
            let parsed: u32 = value.parse().with_context(|| {
                format!("PRACTICE_COACH_MAX_CONNECTIONS is not a number: {value}")
            })?;
            anyhow::ensure!(parsed > 0, "PRACTICE_COACH_MAX_CONNECTIONS must be at least 1");
            Ok(parsed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_connections_defaults_when_unset() {
        assert_eq!(parse_max_connections(None).unwrap(), 5);
        assert_eq!(parse_max_connections(Some("  ")).unwrap(), 5);
    }

    #[test]
    fn max_connections_parses_and_validates() {
        assert_eq!(parse_max_connections(Some("12")).unwrap(), 12);
        assert!(parse_max_connections(Some("0")).is_err());
        assert!(parse_max_connections(Some("many")).is_err());
    }
}
