// src/bin/tdigest_store.rs
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tdigest_store::{Keyspace, LogRecord};
use tracing_subscriber::EnvFilter;

/// The single key the CLI works under; the keyspace is throwaway.
const KEY: &str = "cli";

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Compression parameter for digests built from raw values
    #[arg(short = 'c', long, default_value_t = 100.0)]
    compression: f64,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Build a digest from stdin numbers and print the value at each rank
    Quantile {
        /// Ranks in [0,1]
        #[arg(short, long, num_args = 1.., required = true)]
        q: Vec<f64>,
    },
    /// Build a digest from stdin numbers and print x<TAB>cdf(x) per probe
    Cdf {
        /// Probes: JSON array or space/comma separated numbers.
        /// Defaults to the input values themselves.
        #[arg(long)]
        probes: Option<String>,
    },
    /// Build a digest from stdin numbers and write it as a binary blob
    Save {
        #[arg(long)]
        out: PathBuf,
    },
    /// Query a previously saved blob
    Load {
        #[arg(long)]
        digest: PathBuf,
        /// Ranks in [0,1]
        #[arg(short, long, num_args = 1..)]
        q: Vec<f64>,
        #[arg(long)]
        probes: Option<String>,
    },
    /// Print compression / centroid count / encoded size
    Info {
        /// Read the digest from a blob instead of training from stdin
        #[arg(long)]
        digest: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

fn parse_numbers(s: &str) -> Result<Vec<f64>, Box<dyn Error>> {
    if let Ok(v) = serde_json::from_str::<Vec<f64>>(s) {
        return Ok(v);
    }
    let mut out = Vec::new();
    for tok in s
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|t| !t.is_empty())
    {
        out.push(tok.parse::<f64>()?);
    }
    Ok(out)
}

fn read_stdin_numbers() -> Result<Vec<f64>, Box<dyn Error>> {
    let mut s = String::new();
    io::stdin().read_to_string(&mut s)?;
    parse_numbers(&s)
}

fn keyspace_from_stdin(compression: f64) -> Result<(Keyspace, Vec<f64>), Box<dyn Error>> {
    let values = read_stdin_numbers()?;
    let mut ks = Keyspace::new();
    ks.create(KEY, Some(compression))?;
    let points: Vec<(f64, f64)> = values.iter().map(|&v| (v, 1.0)).collect();
    if !points.is_empty() {
        ks.add(KEY, &points)?;
    }
    Ok((ks, values))
}

fn keyspace_from_blob(path: &Path) -> Result<Keyspace, Box<dyn Error>> {
    let payload = fs::read(path)?;
    let mut ks = Keyspace::new();
    ks.apply_log_record(&LogRecord {
        key: KEY.to_string(),
        payload,
    })?;
    Ok(ks)
}

fn ensure_ranks(q: &[f64]) {
    for &r in q {
        if !(0.0..=1.0).contains(&r) {
            eprintln!("q must be in [0,1], got {r}");
            std::process::exit(2);
        }
    }
}

fn print_quantiles(ks: &mut Keyspace, q: &[f64]) -> Result<(), Box<dyn Error>> {
    for v in ks.quantile(KEY, q)? {
        println!("{v}");
    }
    Ok(())
}

fn print_cdf(ks: &mut Keyspace, probes: &[f64]) -> Result<(), Box<dyn Error>> {
    let ps = ks.cdf(KEY, probes)?;
    for (x, p) in probes.iter().zip(ps.iter()) {
        println!("{x}\t{p}");
    }
    Ok(())
}

fn print_info(ks: &mut Keyspace, json: bool) -> Result<(), Box<dyn Error>> {
    let info = ks.info(KEY)?;
    if json {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("compression\t{}", info.compression);
        println!("centroids\t{}", info.centroid_count);
        println!("encoded_bytes\t{}", info.encoded_size);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match args.cmd {
        Cmd::Quantile { q } => {
            ensure_ranks(&q);
            let (mut ks, _) = keyspace_from_stdin(args.compression)?;
            print_quantiles(&mut ks, &q)?;
        }
        Cmd::Cdf { probes } => {
            let (mut ks, values) = keyspace_from_stdin(args.compression)?;
            let probes = match probes {
                Some(p) => parse_numbers(&p)?,
                None => values,
            };
            print_cdf(&mut ks, &probes)?;
        }
        Cmd::Save { out } => {
            let (mut ks, _) = keyspace_from_stdin(args.compression)?;
            let records = ks.log_rewrite();
            let record = records.first().ok_or("no digest to save")?;
            fs::write(&out, &record.payload)?;
        }
        Cmd::Load { digest, q, probes } => {
            if q.is_empty() && probes.is_none() {
                eprintln!("load needs -q and/or --probes");
                std::process::exit(2);
            }
            ensure_ranks(&q);
            let mut ks = keyspace_from_blob(&digest)?;
            if !q.is_empty() {
                print_quantiles(&mut ks, &q)?;
            }
            if let Some(p) = probes {
                print_cdf(&mut ks, &parse_numbers(&p)?)?;
            }
        }
        Cmd::Info { digest, json } => {
            let mut ks = match digest {
                Some(path) => keyspace_from_blob(&path)?,
                None => keyspace_from_stdin(args.compression)?.0,
            };
            print_info(&mut ks, json)?;
        }
    }
    Ok(())
}
