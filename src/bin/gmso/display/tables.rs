use std::collections::HashMap;
use std::io::Write;

use gmso::{PotentialForms, PotentialKey, PotentialTemplate, PotentialTemplateLibrary, Topology};

use crate::util::text::{truncate, wrap};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

const MAX_DISTRIBUTION_ROWS: usize = 15;

pub fn print_structure_info(out: &mut impl Write, topology: &Topology) {
    let typed = topology
        .sites()
        .iter()
        .filter(|site| site.is_typed())
        .count();

    let mut rows = vec![
        ("Name", topology.name.clone()),
        ("Sites", format!("{} ({} typed)", topology.n_sites(), typed)),
        ("Atom Types", topology.atom_types().len().to_string()),
        ("Connection Types", topology.connection_types().len().to_string()),
        ("Bonds", topology.n_bonds().to_string()),
        ("Angles", topology.n_angles().to_string()),
        ("Dihedrals", topology.n_dihedrals().to_string()),
        ("Impropers", topology.n_impropers().to_string()),
    ];

    match topology.net_charge() {
        Ok(charge) => rows.push(("Net Charge", format!("{charge:+.4} e"))),
        Err(e) => log::warn!("Net charge unavailable: {e}"),
    }

    print_kv_table(out, "Topology Summary", &rows);
}

pub fn print_type_distribution(out: &mut impl Write, topology: &Topology) {
    if topology.n_sites() == 0 {
        return;
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for site in topology.sites() {
        let name = site
            .atom_type
            .and_then(|id| topology.atom_type(id))
            .map_or_else(|| "(untyped)".to_string(), |at| at.name().to_string());
        *counts.entry(name).or_insert(0) += 1;
    }

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    print_distribution_table(out, "Atom Type Distribution", &sorted, topology.n_sites());
}

pub fn print_connection_types(out: &mut impl Write, topology: &Topology) {
    if topology.connection_types().is_empty() {
        return;
    }

    let mut uses: HashMap<usize, usize> = HashMap::new();
    for connection in topology.connections() {
        if let Some(id) = connection.connection_type {
            *uses.entry(id.index()).or_insert(0) += 1;
        }
    }

    let rows: Vec<[String; 3]> = topology
        .connection_types()
        .iter()
        .enumerate()
        .map(|(idx, ct)| {
            let name = match ct.member_types() {
                Some(members) => format!("{} ({})", ct.name(), members.join("-")),
                None => ct.name().to_string(),
            };
            [
                ct.kind().to_string(),
                name,
                uses.get(&idx).copied().unwrap_or(0).to_string(),
            ]
        })
        .collect();

    print_grid(out, "Connection Types", ["Kind", "Name", "Uses"], [8, 32, 6], &rows);
}

pub fn print_templates(out: &mut impl Write, library: &PotentialTemplateLibrary) {
    let rows: Vec<[String; 3]> = library
        .iter()
        .map(|template| {
            [
                template.name().to_string(),
                join(template.independent_variables().iter().map(String::as_str)),
                join(template.parameter_symbols()),
            ]
        })
        .collect();

    print_grid(
        out,
        "Potential Templates",
        ["Name", "Variables", "Parameters"],
        [26, 8, 12],
        &rows,
    );
}

pub fn print_template(out: &mut impl Write, template: &PotentialTemplate) {
    let rows = vec![
        ("Name", template.name().to_string()),
        ("Expression", template.expression().to_string()),
        (
            "Variables",
            join(template.independent_variables().iter().map(String::as_str)),
        ),
        ("Parameters", join(template.parameter_symbols())),
        ("Description", template.description().to_string()),
    ];

    print_kv_table(out, "Potential Template", &rows);
}

pub fn print_compatibility(out: &mut impl Write, topology: &Topology, forms: &PotentialForms) {
    let rows: Vec<[String; 3]> = forms
        .iter()
        .map(|(key, template)| {
            let (kind, name) = match key {
                PotentialKey::AtomType(id) => (
                    "atom".to_string(),
                    topology.atom_type(id).map(|at| at.name().to_string()),
                ),
                PotentialKey::ConnectionType(id) => match topology.connection_type(id) {
                    Some(ct) => (ct.kind().to_string(), Some(ct.name().to_string())),
                    None => ("?".to_string(), None),
                },
            };
            [kind, name.unwrap_or_default(), template.to_string()]
        })
        .collect();

    print_grid(
        out,
        "Matched Potential Forms",
        ["Kind", "Type", "Template"],
        [8, 16, 22],
        &rows,
    );
}

fn join<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let joined = items.into_iter().collect::<Vec<_>>().join(", ");
    if joined.is_empty() { "-".to_string() } else { joined }
}

fn print_grid(
    out: &mut impl Write,
    title: &str,
    headers: [&str; 3],
    widths: [usize; 3],
    rows: &[[String; 3]],
) {
    let [a_w, b_w, c_w] = widths;
    let line = |l: &str, m: &str, r: &str| {
        format!(
            "{INDENT}{l}{}{m}{}{m}{}{r}",
            "─".repeat(a_w + 2),
            "─".repeat(b_w + 2),
            "─".repeat(c_w + 2)
        )
    };

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(out, "{}", line("┌", "┬", "┐"));
    let _ = writeln!(
        out,
        "{}│ {:<a_w$} │ {:<b_w$} │ {:<c_w$} │",
        INDENT, headers[0], headers[1], headers[2]
    );
    let _ = writeln!(out, "{}", line("├", "┼", "┤"));

    for [a, b, c] in rows {
        let _ = writeln!(
            out,
            "{}│ {:<a_w$} │ {:<b_w$} │ {:<c_w$} │",
            INDENT,
            truncate(a, a_w),
            truncate(b, b_w),
            truncate(c, c_w)
        );
    }

    let _ = writeln!(out, "{}", line("└", "┴", "┘"));
}

fn print_distribution_table(
    out: &mut impl Write,
    title: &str,
    data: &[(String, usize)],
    total: usize,
) {
    let name_w = 10usize;
    let count_w = 8usize;
    let sep_overhead = 6;
    let dist_w = SAFE_TABLE_WIDTH.saturating_sub(name_w + count_w + sep_overhead);
    let max_bar_width = dist_w.saturating_sub(8).min(20);

    let rule = |l: &str, m: &str, r: &str| {
        format!(
            "{INDENT}{l}{}{m}{}{m}{}{r}",
            "─".repeat(name_w + 2),
            "─".repeat(count_w + 2),
            "─".repeat(dist_w + 2)
        )
    };

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let _ = writeln!(
        out,
        "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
        INDENT, "Type", "Count", "Distribution"
    );
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    for (name, count) in data.iter().take(MAX_DISTRIBUTION_ROWS) {
        let pct = (*count as f64 / total as f64) * 100.0;
        let dist_cell = format!("{}  {:>5.1}%", make_bar(pct, max_bar_width), pct);
        let _ = writeln!(
            out,
            "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            INDENT,
            truncate(name, name_w),
            count,
            dist_cell
        );
    }

    if data.len() > MAX_DISTRIBUTION_ROWS {
        let _ = writeln!(
            out,
            "{}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            INDENT,
            "...",
            "...",
            format!("({} more types)", data.len() - MAX_DISTRIBUTION_ROWS)
        );
    }

    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

/// Key/value table; long values wrap onto continuation rows.
fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{k_line}┬{v_line}┐",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );

    for (key, val) in rows {
        for (i, chunk) in wrap(val, val_w).iter().enumerate() {
            let key = if i == 0 { truncate(key, key_w) } else { String::new() };
            let _ = writeln!(
                out,
                "{}│ {:<key_w$} │ {:<val_w$} │",
                INDENT,
                key,
                truncate(chunk, val_w)
            );
        }
    }

    let _ = writeln!(
        out,
        "{}└{k_line}┴{v_line}┘",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
}

fn make_bar(pct: f64, max_width: usize) -> String {
    let filled = ((pct / 100.0) * max_width as f64).round() as usize;
    let empty = max_width.saturating_sub(filled);
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmso::{AtomType, Connection, ConnectionKind, ConnectionType, Site};

    fn render(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer);
        String::from_utf8(buffer).unwrap()
    }

    fn water() -> Topology {
        let mut top = Topology::new("water");
        let ow = top.add_atom_type(AtomType::with_defaults("OW"));
        let hw = top.add_atom_type(AtomType::with_defaults("HW"));
        let oh = top.add_connection_type(ConnectionType::with_defaults(ConnectionKind::Bond));
        let o = top.add_site(Site::new("O", [0.0; 3]).with_atom_type(ow)).unwrap();
        let h1 = top.add_site(Site::new("H1", [0.1, 0.0, 0.0]).with_atom_type(hw)).unwrap();
        let h2 = top.add_site(Site::new("H2", [0.0, 0.1, 0.0]).with_atom_type(hw)).unwrap();
        top.add_connection(Connection::bond(o, h1).with_type(oh)).unwrap();
        top.add_connection(Connection::bond(o, h2).with_type(oh)).unwrap();
        top
    }

    #[test]
    fn bar_is_proportional() {
        assert_eq!(make_bar(50.0, 4), "██░░");
        assert_eq!(make_bar(0.0, 3), "░░░");
        assert_eq!(make_bar(100.0, 2), "██");
    }

    #[test]
    fn summary_lists_counts() {
        let text = render(|out| print_structure_info(out, &water()));
        assert!(text.contains("Topology Summary"));
        assert!(text.contains("3 (3 typed)"));
        assert!(text.contains("Bonds"));
    }

    #[test]
    fn distribution_orders_by_count() {
        let text = render(|out| print_type_distribution(out, &water()));
        let hw = text.find("HW").unwrap();
        let ow = text.find("OW").unwrap();
        assert!(hw < ow);
        assert!(text.contains("66.7%"));
    }

    #[test]
    fn connection_types_count_their_uses() {
        let text = render(|out| print_connection_types(out, &water()));
        assert!(text.contains("BondType"));
        assert!(text.lines().any(|l| l.contains("bond") && l.contains(" 2 ")));
    }

    #[test]
    fn template_detail_wraps_long_expressions() {
        let library = PotentialTemplateLibrary::global();
        let template = library.get("RyckaertBellemansTorsionPotential").unwrap();
        let text = render(|out| print_template(out, template));
        assert!(text.contains("Expression"));
        assert!(text.lines().all(|l| l.chars().count() <= INDENT.len() + BOX_INNER_WIDTH));
    }
}
