use anyhow::{Context, Result};
use mpds_client::{config, Config, DataType};
use toml_edit::{value, DocumentMut};

const STRING_KEYS: [&str; 4] = ["api_key", "endpoint", "export_dir", "cache_path"];
const INTEGER_KEYS: [&str; 3] = ["pagesize", "max_npages", "max_nphases"];
const VALID_KEYS: &str =
    "api_key, endpoint, dtype, pagesize, max_npages, max_nphases, chillout_secs, export_dir, cache_path";

fn masked(key: Option<&str>) -> String {
    match key {
        Some(key) if key.chars().count() > 4 => format!("{}…", key.chars().take(4).collect::<String>()),
        Some(_) => "<set>".to_string(),
        None => "<not set>".to_string(),
    }
}

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  api_key: {}", masked(config.api_key.as_deref()));
    println!("  endpoint: {}", config.endpoint);
    println!("  dtype: {}", config.dtype);
    println!("  pagesize: {}", config.pagesize);
    println!("  max_npages: {}", config.max_npages);
    println!("  max_nphases: {}", config.max_nphases);
    println!("  chillout_secs: {}", config.chillout_secs);
    println!("  export_dir: {}", config.export_dir.display());
    println!("  cache_path: {}", config.cache_path.display());

    println!("\nPriority: CLI args > ENV vars (MPDS_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value.
pub fn get_config(key: Option<&str>) -> Result<()> {
    let Some(key) = key else {
        let config_path = config::config_file_path();
        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{contents}");
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'mpds config init' to create it.");
        }
        return Ok(());
    };

    let config = Config::load()?;
    let shown = match key {
        "api_key" => config.api_key.unwrap_or_else(|| String::from("<not set>")),
        "endpoint" => config.endpoint,
        "dtype" => config.dtype.to_string(),
        "pagesize" => config.pagesize.to_string(),
        "max_npages" => config.max_npages.to_string(),
        "max_nphases" => config.max_nphases.to_string(),
        "chillout_secs" => config.chillout_secs.to_string(),
        "export_dir" => config.export_dir.display().to_string(),
        "cache_path" => config.cache_path.display().to_string(),
        _ => anyhow::bail!("Unknown config key: {key}\n\nValid keys: {VALID_KEYS}"),
    };
    println!("{shown}");

    Ok(())
}

/// Set `key` in the TOML text `contents`, keeping comments and layout.
pub fn set_key(contents: &str, key: &str, raw: &str) -> Result<String> {
    let mut doc = contents
        .parse::<DocumentMut>()
        .context("Failed to parse config file")?;

    if STRING_KEYS.contains(&key) {
        doc[key] = value(raw);
    } else if INTEGER_KEYS.contains(&key) {
        let n: i64 = raw
            .parse()
            .with_context(|| format!("{key} must be an integer, got {raw:?}"))?;
        if n <= 0 {
            anyhow::bail!("{key} must be positive");
        }
        doc[key] = value(n);
    } else if key == "chillout_secs" {
        let secs: f64 = raw
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}"))?;
        if std::time::Duration::try_from_secs_f64(secs).is_err() {
            anyhow::bail!("{key} must be a non-negative number of seconds");
        }
        doc[key] = value(secs);
    } else if key == "dtype" {
        let dtype: DataType = raw.parse().map_err(anyhow::Error::msg)?;
        doc[key] = value(dtype.as_str());
    } else {
        anyhow::bail!("Unknown config key: {key}\n\nValid keys: {VALID_KEYS}");
    }

    Ok(doc.to_string())
}

/// Set a config value.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    let config_path = config::config_file_path();

    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let updated = set_key(&contents, key, raw)?;
    std::fs::write(&config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {key} = {raw}");
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() {
    println!("{}", config::config_file_path().display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure the MPDS toolkit.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
