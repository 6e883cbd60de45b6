use etf::*;
use std::io::{self, Read};
use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

/// Decode and print ETF messages
#[derive(StructOpt)]
#[structopt(name = "etfq", author = "Liv Fischer")]
struct Opt {
    /// treat the input as base64 text, as found in logs and JSON payloads
    #[structopt(short, long)]
    base64: bool,
    /// keep binaries as bytes, even if they are valid utf-8
    #[structopt(long)]
    bytes: bool,
    /// print atoms as strings
    #[structopt(long)]
    atoms_as_strings: bool,
    /// maximum nesting of lists, tuples and maps
    #[structopt(long, default_value = "512")]
    max_depth: usize,
}

impl Opt {
    fn config(&self) -> DecoderConfig {
        let mut config = DecoderConfig::default().max_depth(self.max_depth);
        if self.bytes {
            config = config.binaries(BinaryDecoding::Bytes);
        }
        if self.atoms_as_strings {
            config = config.atoms(AtomDecoding::String);
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
    let opt = Opt::from_args();
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer).context("Failed to read stdin")?;
    let value = decode(&opt, &buffer)?;
    println!("{}", &value);
    Ok(())
}

fn decode(opt: &Opt, buffer: &[u8]) -> Result<Value> {
    let bytes = if opt.base64 {
        let text: Vec<u8> = buffer.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
        base64::decode(&text).context("input is not base64")?
    } else {
        buffer.to_vec()
    };
    tracing::debug!(len = bytes.len(), "decoding message");
    let value = unpack_with(&bytes, &opt.config()).context("Decoding error")?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{decode, Opt};
    use etf::Value;

    fn opt() -> Opt {
        Opt { base64: false, bytes: false, atoms_as_strings: false, max_depth: 512 }
    }

    #[test]
    fn raw() {
        assert_eq!(Value::from(42), decode(&opt(), &[131, 97, 42]).unwrap());
    }

    #[test]
    fn base64_with_newline() {
        let opt = Opt { base64: true, ..opt() };
        assert_eq!(Value::from(42), decode(&opt, b"g2Eq\n").unwrap());
        assert!(decode(&opt, b"g2E*").is_err());
    }

    #[test]
    fn flags() {
        let opt = Opt { bytes: true, atoms_as_strings: true, ..opt() };
        assert_eq!(Value::Binary(b"a".to_vec()), decode(&opt, &[131, 109, 0, 0, 0, 1, b'a']).unwrap());
        assert_eq!(Value::from("ok"), decode(&opt, &[131, 119, 2, b'o', b'k']).unwrap());
        let opt = Opt { max_depth: 0, ..super::tests::opt() };
        assert!(decode(&opt, &[131, 108, 0, 0, 0, 1, 97, 1, 106]).is_err());
    }
}
