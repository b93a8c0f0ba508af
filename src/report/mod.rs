use std::io::{self, Write};

pub const BANNER: [&str; 3] = [
    "#########################",
    "#   PI HOLE BLACKLIST   #",
    "#########################",
];

/// Write the banner and then each address on its own line, as given.
pub fn emit<W: Write, S: AsRef<str>>(out: &mut W, addresses: &[S]) -> io::Result<()> {
    for line in BANNER {
        writeln!(out, "{}", line)?;
    }
    for address in addresses {
        writeln!(out, "{}", address.as_ref())?;
    }
    out.flush()
}

/// Hostnames from the query log, one per line with CRLF endings.
pub fn emit_hosts<W: Write, S: AsRef<str>>(out: &mut W, hosts: &[S]) -> io::Result<()> {
    for host in hosts {
        write!(out, "{}\r\n", host.as_ref())?;
    }
    out.flush()
}
