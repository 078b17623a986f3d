use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use mpds_client::miners::{bandgap_clusters, liquidus, melting_expansion, nonformers};
use mpds_client::{Config, DataType};
use mpds_core::export::Exporter;

use super::api_client;

pub async fn run_nonformers(config: &Config) -> Result<()> {
    let client = api_client(config)?;
    let found = nonformers(&client).await?;

    println!("Binary nonformers: {}", found.len());
    for system in &found {
        println!("{}", system.join("-"));
    }
    Ok(())
}

pub async fn run_liquidus(config: &Config, a: &str, b: &str) -> Result<()> {
    let client = api_client(config)?;
    let report = liquidus(&client, a, b).await?;

    println!(
        "Temperature window: {} - {} K, {} line(s)",
        report.temp_min,
        report.temp_max,
        report.lines.len()
    );
    for line in &report.lines {
        let points: Vec<String> = line
            .points
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect();
        println!("{}: {}", line.entry, points.join(" "));
    }
    Ok(())
}

pub async fn run_melting(config: &Config) -> Result<()> {
    let client = api_client(config)?;
    if config.dtype == DataType::MachineLearning {
        log::warn!("Machine-learning data should be taken with a grain of salt");
    }
    for item in melting_expansion(&client).await? {
        println!(
            "{} T_melt = {:.0} C \t alpha^E5 = {:.2}",
            item.formula, item.t_melt, item.alpha_e5
        );
    }
    Ok(())
}

pub async fn run_clusters(config: &Config, seed: Option<u64>) -> Result<()> {
    let client = api_client(config)?;
    let exporter = Exporter::new(&config.export_dir)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let clusters = bandgap_clusters(&client, &exporter, &mut rng).await?;

    println!("{} compounds clustered", clusters.rows.len());
    println!("{}", clusters.exported.csv.display());
    println!("{}", clusters.exported.json.display());
    Ok(())
}
