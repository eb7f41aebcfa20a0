//! `sample` and `ranges`: inspect the event generator without a cluster.

use loadtest_generator::{extract_project_id, EventGenerator, EventPools, DEFAULT_PROJECT_ID};
use std::io::{self, Write};

/// Print one generated event as pretty JSON.
pub fn write_sample(
    out: &mut impl Write,
    project_id: u64,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let mut generator = EventGenerator::new(project_id, EventPools::default(), seed)?;
    writeln!(out, "{}", generator.generate().to_json_pretty()?)?;
    Ok(())
}

/// Print the generator pools and, optionally, the project id parsed from a
/// topic name.
pub fn write_ranges(out: &mut impl Write, test_topic: Option<&str>) -> io::Result<()> {
    let pools = EventPools::default();
    writeln!(out, "CURRENT RANGES:")?;
    writeln!(
        out,
        "   Campaign IDs: {:?} ({} campaigns)",
        pools.campaign_ids,
        pools.campaign_ids.len()
    )?;
    writeln!(
        out,
        "   Template IDs: {:?} ({} templates)",
        pools.template_ids,
        pools.template_ids.len()
    )?;
    writeln!(out, "   User domains: {:?}", pools.user_domains)?;
    writeln!(out, "   User prefixes: {:?}", pools.user_prefixes)?;
    writeln!(out, "   Default project ID: {DEFAULT_PROJECT_ID}")?;

    if let Some(topic) = test_topic {
        writeln!(out, "\nTOPIC PARSING TEST:")?;
        writeln!(out, "   Topic: {topic}")?;
        match extract_project_id(topic) {
            Some(id) => writeln!(out, "   Extracted project ID: {id}")?,
            None => writeln!(out, "   Could not extract project ID")?,
        }
    }

    writeln!(out, "\nEXAMPLES:")?;
    writeln!(
        out,
        "   # Auto-detect project ID and use 20 campaigns starting from 1000:"
    )?;
    writeln!(
        out,
        "   pulsar-snapshot publish persistent://eventbus/org-1/post-ingestion-495 \\"
    )?;
    writeln!(
        out,
        "     --count 100000 --rate 2000 --campaign-start 1000 --campaign-count 20"
    )?;
    writeln!(out)?;
    writeln!(out, "   # Manual project ID with specific campaigns:")?;
    writeln!(out, "   pulsar-snapshot publish persistent://eventbus/org-1/topic \\")?;
    writeln!(out, "     --project-id 123 --campaign-ids 100,200,300,400,500")?;
    Ok(())
}

pub fn run_sample(project_id: u64, seed: Option<u64>) -> anyhow::Result<()> {
    write_sample(&mut io::stdout(), project_id, seed)
}

pub fn run_ranges(test_topic: Option<&str>) -> anyhow::Result<()> {
    write_ranges(&mut io::stdout(), test_topic)?;
    Ok(())
}
