use std::io;
use std::net::Ipv4Addr;
use std::path::Path;
use tokio::fs::read_to_string;

/// Read the root server list: one IPv4 address per line, blank lines
/// and trailing newlines tolerated.  Order is preserved, as it is the
/// order servers are tried in.
pub async fn load_root_hints<P: AsRef<Path>>(path: P) -> io::Result<Vec<Ipv4Addr>> {
    let data = read_to_string(path).await?;
    parse_root_hints(&data)
}

fn parse_root_hints(data: &str) -> io::Result<Vec<Ipv4Addr>> {
    let mut roots = Vec::new();

    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse() {
            Ok(address) => roots.push(address),
            Err(error) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("bad root server address '{line}': {error}"),
                ))
            }
        }
    }

    Ok(roots)
}
