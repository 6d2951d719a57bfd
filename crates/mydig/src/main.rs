use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use tokio::fs;
use tracing_subscriber::EnvFilter;

use dns_resolver::types::{QueryKind, Request};
use dns_resolver::util::fs::load_root_hints;
use dns_resolver::Resolver;
use dns_types::protocol::types::DomainName;

const ROOT_HINTS_FILENAME: &str = "root_server_ipv4s.txt";
const INPUT_FILENAME: &str = "mydig_input.txt";
const OUTPUT_FILENAME: &str = "mydig_output.txt";
const INPUT_FILENAME_DNSSEC: &str = "mydig_input_dnssec.txt";
const OUTPUT_FILENAME_DNSSEC: &str = "mydig_output_dnssec.txt";

// the doc comments for this struct turn into the CLI help text
#[derive(Parser)]
/// Iterative DNS lookup utility
///
/// Resolves each query by walking referrals from the root servers
/// downward, with no recursion requested from any nameserver.  With
/// --dnssec, every delegation and the final answer are additionally
/// verified against the root trust anchor, and any verification
/// failure is reported in the output.
///
/// With a domain and query type on the command line the response is
/// printed to stdout; with no arguments, queries are read from the
/// input file (one "<name> <type>" per line) and the rendered
/// responses are written to the output file.
struct Args {
    /// Domain name to resolve; omit to read queries from the input
    /// file
    #[clap(value_parser)]
    domain: Option<DomainName>,

    /// Query type to resolve (A, NS, or MX)
    #[clap(value_parser)]
    qtype: Option<QueryKind>,

    /// Validate responses with DNSSEC
    #[clap(long, action(clap::ArgAction::SetTrue))]
    dnssec: bool,

    /// Path to the root server list, one IPv4 address per line
    #[clap(short, long, value_parser, default_value = ROOT_HINTS_FILENAME)]
    root_hints: PathBuf,

    /// Input file for batch mode
    #[clap(short, long, value_parser)]
    input: Option<PathBuf>,

    /// Output file for batch mode
    #[clap(short, long, value_parser)]
    output: Option<PathBuf>,
}

fn parse_query_line(line: &str) -> Option<Request> {
    let (name, qtype) = line.split_once(' ')?;
    Some(Request {
        name: name.parse().ok()?,
        qtype: qtype.trim().parse().ok()?,
    })
}

async fn run_batch(resolver: &mut Resolver, input: &Path, output: &Path) {
    let data = match fs::read_to_string(input).await {
        Ok(data) => data,
        Err(error) => {
            tracing::error!(?input, %error, "could not read input file");
            process::exit(1);
        }
    };

    let mut rendered = String::new();
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(request) = parse_query_line(line) else {
            tracing::warn!(%line, "skipping invalid query line");
            continue;
        };
        let response = resolver.resolve(&request).await;
        rendered.push_str(&response.to_string());
    }

    if let Err(error) = fs::write(output, rendered).await {
        tracing::error!(?output, %error, "could not write output file");
        process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let roots = match load_root_hints(&args.root_hints).await {
        Ok(roots) if !roots.is_empty() => roots,
        Ok(_) => {
            tracing::error!(path = ?args.root_hints, "root server list is empty");
            process::exit(1);
        }
        Err(error) => {
            tracing::error!(path = ?args.root_hints, %error, "could not read root server list");
            process::exit(1);
        }
    };

    let mut resolver = if args.dnssec {
        match Resolver::new_validating(roots).await {
            Ok(resolver) => resolver,
            Err(error) => {
                tracing::error!(%error, "could not install the root trust anchor");
                process::exit(1);
            }
        }
    } else {
        Resolver::new(roots)
    };

    match (args.domain, args.qtype) {
        (Some(domain), Some(qtype)) => {
            let response = resolver
                .resolve(&Request {
                    name: domain,
                    qtype,
                })
                .await;
            print!("{response}");
        }
        (Some(_), None) => {
            eprintln!("a query type (A, NS, or MX) is required alongside a domain");
            process::exit(2);
        }
        (None, _) => {
            let (default_input, default_output) = if args.dnssec {
                (INPUT_FILENAME_DNSSEC, OUTPUT_FILENAME_DNSSEC)
            } else {
                (INPUT_FILENAME, OUTPUT_FILENAME)
            };
            let input = args.input.unwrap_or_else(|| PathBuf::from(default_input));
            let output = args.output.unwrap_or_else(|| PathBuf::from(default_output));
            run_batch(&mut resolver, &input, &output).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_query_line_accepts_name_and_type() {
        let request = parse_query_line("www.example.com A").unwrap();
        assert_eq!("www.example.com.", request.name.to_dotted_string());
        assert_eq!(QueryKind::A, request.qtype);
    }

    #[test]
    fn parse_query_line_rejects_unsupported_types() {
        assert!(parse_query_line("www.example.com AAAA").is_none());
        assert!(parse_query_line("www.example.com").is_none());
        assert!(parse_query_line("").is_none());
    }

    #[test]
    fn parse_query_line_tolerates_trailing_whitespace() {
        assert!(parse_query_line("example.com MX ").is_some());
    }
}
