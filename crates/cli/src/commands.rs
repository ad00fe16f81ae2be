//! Interactive command parsing and dispatch.
//!
//! Parsing is pure and rejects malformed arguments before any I/O. Dispatch
//! calls into [`Session`] and prints results; errors are returned to the loop,
//! which prints them and keeps going.

use linker_client::{LinkScope, Session};
use linker_client::report::{HierarchyComparison, Report};
use linker_client::session::SnapshotOrigin;
use linker_core::mapping::DOMAINS;
use linker_core::{Error, PageSnapshot, UrlMatch};

const HELP: &str = "\
Commands:
  set URL <url>              page to analyze
  set SELECTOR <css>         content region selector
  set PROPOSED_PATH <path>   proposed path for the current page
  show [variables|domains|page]
  load <domain> <row>        load a DSM row and make its URL current
  check [refresh]            analyze the current page (cached unless refresh)
  links                      list links, PDFs and embeds of the last check
  lookup <url>               find the DSM row listing a URL
  dsm                        dump every cell of the loaded DSM row
  report                     write the HTML report
  cache clear                delete cached snapshots
  help
  exit | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Url,
    Selector,
    ProposedPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowTarget {
    Variables,
    Domains,
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { var: Variable, value: String },
    Show(ShowTarget),
    Load { domain: String, row: u32 },
    Check { refresh: bool },
    Links,
    Lookup(String),
    Dsm,
    Report,
    CacheClear,
    Help,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

fn malformed(message: impl Into<String>) -> Error {
    Error::MalformedInput(message.into())
}

/// Parse a 1-based row number.
fn parse_row(raw: &str) -> Result<u32, Error> {
    match raw.parse::<u32>() {
        Ok(row) if row > 0 => Ok(row),
        _ => Err(malformed(format!("row must be a positive integer, got '{raw}'"))),
    }
}

fn parse_variable(raw: &str) -> Result<Variable, Error> {
    match raw.to_ascii_uppercase().as_str() {
        "URL" => Ok(Variable::Url),
        "SELECTOR" => Ok(Variable::Selector),
        "PROPOSED_PATH" => Ok(Variable::ProposedPath),
        _ => Err(malformed(format!("unknown variable '{raw}'; expected URL, SELECTOR or PROPOSED_PATH"))),
    }
}

/// Parse one input line. Blank lines give `None`.
///
/// Domain names may contain spaces, so `load` takes the last word as the row.
pub fn parse_command(line: &str) -> Result<Option<Command>, Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match word.to_ascii_lowercase().as_str() {
        "set" => {
            let (var, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let var = parse_variable(var)?;
            let value = value.trim();
            if value.is_empty() && var != Variable::ProposedPath {
                return Err(malformed("usage: set <URL|SELECTOR|PROPOSED_PATH> <value>"));
            }
            Command::Set { var, value: value.to_string() }
        }
        "show" => match rest.to_ascii_lowercase().as_str() {
            "" | "variables" | "vars" => Command::Show(ShowTarget::Variables),
            "domains" => Command::Show(ShowTarget::Domains),
            "page" => Command::Show(ShowTarget::Page),
            other => return Err(malformed(format!("unknown show target '{other}'"))),
        },
        "load" => {
            let Some((domain, row)) = rest.rsplit_once(char::is_whitespace) else {
                return Err(malformed("usage: load <domain> <row>"));
            };
            let row = parse_row(row.trim())?;
            Command::Load { domain: domain.trim().to_string(), row }
        }
        "check" => match rest {
            "" => Command::Check { refresh: false },
            "refresh" => Command::Check { refresh: true },
            other => return Err(malformed(format!("unexpected argument '{other}'"))),
        },
        "links" => Command::Links,
        "lookup" if !rest.is_empty() => Command::Lookup(rest.to_string()),
        "lookup" => return Err(malformed("usage: lookup <url>")),
        "dsm" => Command::Dsm,
        "report" => Command::Report,
        "cache" if rest.eq_ignore_ascii_case("clear") => Command::CacheClear,
        "cache" => return Err(malformed("usage: cache clear")),
        "help" | "?" => Command::Help,
        "exit" | "quit" => Command::Exit,
        other => return Err(malformed(format!("unknown command '{other}'; type `help`"))),
    };
    Ok(Some(command))
}

fn format_variables(session: &Session) -> String {
    let mapping = match session.mapping() {
        Ok(index) => index.source().map(|p| p.display().to_string()).unwrap_or_else(|| "in memory".into()),
        Err(_) => "not loaded".into(),
    };
    [
        ("URL", session.url().unwrap_or("").to_string()),
        ("SELECTOR", session.selector().to_string()),
        ("PROPOSED_PATH", session.proposed_path().unwrap_or("").to_string()),
        ("DOMAIN", session.domain().unwrap_or("").to_string()),
        ("ROW", session.row().map(|r| r.to_string()).unwrap_or_default()),
        ("DSM", mapping),
    ]
    .iter()
    .map(|(name, value)| format!("{name:<14}{value}"))
    .collect::<Vec<_>>()
    .join("\n")
}

fn format_domains() -> String {
    DOMAINS
        .iter()
        .map(|d| match d.aliases {
            [] => d.name.to_string(),
            aliases => format!("{} ({})", d.name, aliases.join(", ")),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_snapshot(snapshot: &PageSnapshot) -> String {
    let mut lines = vec![format!("URL:       {}", snapshot.source_url)];
    if let Some(final_url) = &snapshot.final_url
        && final_url != &snapshot.source_url
    {
        lines.push(format!("Final URL: {final_url}"));
    }
    lines.push(format!("Selector:  {}", snapshot.selector));
    if let Some(error) = &snapshot.error {
        lines.push(format!("Error:     {error}"));
        return lines.join("\n");
    }
    if !snapshot.selector_matched {
        lines.push("Warning:   selector matched nothing, whole document used".to_string());
    }

    let (links, pdfs, embeds) = snapshot.counts();
    let broken = snapshot.links.iter().chain(&snapshot.pdfs).filter(|l| l.status_code() == Some(404)).count();
    lines.push(format!("Found:     {links} links, {pdfs} PDFs, {embeds} embeds ({broken} broken)"));
    if let Some(sidebar) = &snapshot.sidebar {
        lines.push(format!(
            "Sidebar:   {} links, {} PDFs, {} embeds",
            sidebar.links.len(),
            sidebar.pdfs.len(),
            sidebar.embeds.len()
        ));
    }
    lines.push(format!("Difficulty: {:.0}%", snapshot.difficulty() * 100.0));
    lines.join("\n")
}

fn format_items(report: &Report) -> String {
    if report.items.is_empty() {
        return "No links or resources found.".to_string();
    }

    let mut lines: Vec<String> = report
        .items
        .iter()
        .map(|item| {
            let status = item.status.as_deref().unwrap_or("-");
            let mapping = match &item.mapping {
                Some(m) if m.mapped => format!(" -> {}", m.proposed_path.as_deref().unwrap_or("")),
                Some(m) if m.scope == LinkScope::Internal => " -> UNMAPPED".to_string(),
                _ => String::new(),
            };
            format!("[{:<13}] {status:>4}  {}  {}{mapping}", item.kind.label(), item.text, item.copy_value)
        })
        .collect();

    if let Some(summary) = &report.summary {
        lines.push(format!(
            "Internal: {} (mapped {}, unmapped {}), external: {}",
            summary.total_internal, summary.mapped, summary.unmapped, summary.external
        ));
    }
    lines.join("\n")
}

fn format_lookup(found: &UrlMatch) -> String {
    let trail = HierarchyComparison::new(&found.row.existing_url, &found.row.proposed_path).proposed_trail();
    format!(
        "{} row {}\nExisting: {}\nProposed: {}\nHierarchy: {trail}",
        found.domain, found.row.row_number, found.row.existing_url, found.row.proposed_path
    )
}

/// Run one command against the session.
pub async fn execute(session: &mut Session, command: Command) -> Result<Flow, Error> {
    match command {
        Command::Set { var: Variable::Url, value } => session.set_url(&value)?,
        Command::Set { var: Variable::Selector, value } => session.set_selector(&value)?,
        Command::Set { var: Variable::ProposedPath, value } => session.set_proposed_path(&value),
        Command::Show(ShowTarget::Variables) => println!("{}", format_variables(session)),
        Command::Show(ShowTarget::Domains) => println!("{}", format_domains()),
        Command::Show(ShowTarget::Page) => match session.snapshot() {
            Some(snapshot) => println!("{}", format_snapshot(snapshot)),
            None => println!("No page analyzed yet."),
        },
        Command::Load { domain, row } => {
            let pair = session.load_mapping(&domain, row).await?;
            let domain = session.domain().unwrap_or(&domain);
            println!("{domain} row {row}\nExisting: {}\nProposed: {}", pair.existing_url, pair.proposed_path);
        }
        Command::Check { refresh } => {
            let (snapshot, origin) = session.check(refresh).await?;
            println!("{}", format_snapshot(snapshot));
            if origin == SnapshotOrigin::Cached {
                println!("(from cache; `check refresh` to refetch)");
            }
        }
        Command::Links => println!("{}", format_items(&session.build_report()?)),
        Command::Lookup(url) => match session.lookup(&url)? {
            Some(found) => println!("{}", format_lookup(&found)),
            None => println!("No DSM row lists {url}."),
        },
        Command::Dsm => {
            for (header, value) in session.row_cells()? {
                println!("{header}: {value}");
            }
        }
        Command::Report => {
            let path = session.write_report().await?;
            println!("Report written to {}", path.display());
        }
        Command::CacheClear => {
            let deleted = session.clear_cache().await?;
            println!("Deleted {deleted} cached snapshots.");
        }
        Command::Help => println!("{HELP}"),
        Command::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linker_core::{LinkRecord, MigrationRow};

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_command("check").unwrap(), Some(Command::Check { refresh: false }));
        assert_eq!(parse_command("  CHECK refresh ").unwrap(), Some(Command::Check { refresh: true }));
        assert_eq!(parse_command("links").unwrap(), Some(Command::Links));
        assert_eq!(parse_command("cache clear").unwrap(), Some(Command::CacheClear));
        assert_eq!(parse_command("quit").unwrap(), Some(Command::Exit));
        assert_eq!(parse_command("show").unwrap(), Some(Command::Show(ShowTarget::Variables)));
        assert_eq!(parse_command("show domains").unwrap(), Some(Command::Show(ShowTarget::Domains)));
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse_command("set url https://education.musc.edu/a b").unwrap(),
            Some(Command::Set { var: Variable::Url, value: "https://education.musc.edu/a b".into() })
        );
        assert_eq!(
            parse_command("set PROPOSED_PATH").unwrap(),
            Some(Command::Set { var: Variable::ProposedPath, value: String::new() })
        );
        assert!(matches!(parse_command("set SELECTOR"), Err(Error::MalformedInput(_))));
        assert!(matches!(parse_command("set COLOR red"), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_parse_load_multi_word_domain() {
        assert_eq!(
            parse_command("load Adult Health 12").unwrap(),
            Some(Command::Load { domain: "Adult Health".into(), row: 12 })
        );
        assert_eq!(parse_command("load HCC 5").unwrap(), Some(Command::Load { domain: "HCC".into(), row: 5 }));
    }

    #[test]
    fn test_parse_rejects_bad_row() {
        assert!(matches!(parse_command("load Education abc"), Err(Error::MalformedInput(_))));
        assert!(matches!(parse_command("load Education 0"), Err(Error::MalformedInput(_))));
        assert!(matches!(parse_command("load Education -3"), Err(Error::MalformedInput(_))));
        assert!(matches!(parse_command("load 5"), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_parse_unknown() {
        assert!(matches!(parse_command("crawl everything"), Err(Error::MalformedInput(_))));
        assert!(matches!(parse_command("lookup"), Err(Error::MalformedInput(_))));
        assert!(matches!(parse_command("cache purge"), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_format_snapshot() {
        let mut snapshot = PageSnapshot::failed("https://education.musc.edu/", "#main", "x");
        snapshot.error = None;
        snapshot.selector_matched = true;
        snapshot.links = vec![
            LinkRecord::new("A", "https://education.musc.edu/a", "200"),
            LinkRecord::new("B", "https://education.musc.edu/b", "404"),
        ];
        let text = format_snapshot(&snapshot);
        assert!(text.contains("2 links, 0 PDFs, 0 embeds (1 broken)"));
        assert!(text.contains("Difficulty: 100%"));

        let failed = PageSnapshot::failed("https://down.example", "#main", "NETWORK_ERROR: refused");
        assert!(format_snapshot(&failed).contains("Error:     NETWORK_ERROR: refused"));
    }

    #[test]
    fn test_format_domains_lists_aliases() {
        let text = format_domains();
        assert!(text.contains("Hollings Cancer (Hollings Cancer Center, HCC, Hollings)"));
        assert!(text.lines().any(|l| l == "Enterprise"));
    }

    #[test]
    fn test_format_lookup() {
        let found = UrlMatch {
            domain: "Education".into(),
            row: MigrationRow {
                domain: "Education".into(),
                row_number: 7,
                existing_url: "https://education.musc.edu/students".into(),
                proposed_path: "/students/life".into(),
                has_multiple_urls: false,
            },
        };
        let text = format_lookup(&found);
        assert!(text.starts_with("Education row 7"));
        assert!(text.contains("Hierarchy: Education / students / life"));
    }
}
