//! Build an index from a file of sequences, encrypt it, and run one
//! encrypted location query.
//!
//! Usage:
//!   cargo run --release --example build_and_query -- <sequences.txt> <query> [position]
//!
//! The file holds one sequence per line; line `n` gets record index `n`.
//! Set `RUST_LOG=cipher_gst=debug` to see per-step logging.

use cipher_gst::{LabelCipher, LocalOracle, SuffixTree, XorKeystream};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(query)) = (args.next(), args.next()) else {
        eprintln!("Usage: build_and_query <sequences.txt> <query> [position]");
        std::process::exit(1);
    };
    let position: usize = args.next().map(|p| p.parse()).transpose()?.unwrap_or(1);

    let reader = BufReader::new(File::open(&path)?);
    let sequences: Vec<String> = reader
        .lines()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|l| !l.is_empty())
        .collect();
    println!("Loaded {} sequences from {}", sequences.len(), path);

    let start = Instant::now();
    let mut tree = SuffixTree::new();
    for (i, seq) in sequences.iter().enumerate() {
        let idx = i as u32 + 1;
        tree.insert(seq.as_bytes(), idx)?;
        tree.index_positions(seq.as_bytes(), idx)?;
    }
    println!(
        "Tree building time: {:?} ({} nodes)",
        start.elapsed(),
        tree.node_count()
    );

    // One key symbol per label symbol; labels never exceed the longest sequence.
    let key_len = sequences.iter().map(String::len).max().unwrap_or(0).max(20);
    let mut rng = StdRng::from_entropy();
    let secret: Vec<u8> = (0..key_len)
        .map(|_| if rng.gen_bool(0.5) { b'1' } else { b'0' })
        .collect();
    let cipher = XorKeystream::new(secret)?;

    let start = Instant::now();
    let encrypted = tree.encrypt(&cipher)?;
    println!("Tree encryption time: {:?}", start.elapsed());

    let start = Instant::now();
    let mut oracle = LocalOracle::new();
    let hits = encrypted.encrypted_search(query.as_bytes(), position, &cipher, &mut oracle)?;
    println!("Total result found: {}", hits.len());
    println!("Searching time: {:?}", start.elapsed());

    println!("=========================== result ===========================");
    println!("Query: {query}\n");
    for hit in &hits {
        let seq = String::from_utf8_lossy(&cipher.apply(&hit.sequence)?).into_owned();
        println!(
            "Sequence No: {}, Match length: {}, Matched portion: {}",
            seq,
            hit.matched_len,
            String::from_utf8_lossy(&query.as_bytes()[..hit.matched_len])
        );
    }
    println!("Oracle round-trips: {}", oracle.round_trips());
    Ok(())
}
