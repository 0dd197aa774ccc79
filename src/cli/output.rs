//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{AccessList, AccessListing};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print secret names, one per row.
pub fn print_secrets_table(names: &[&str]) {
    if names.is_empty() {
        info("No secrets in this vault yet.");
        tip("Run `memevault set <KEY> <VALUE>` to add your first secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name"]);
    for name in names {
        table.add_row(vec![name.to_string()]);
    }

    println!("{table}");
}

/// Print the vault's access list, marking the caller's own key.
pub fn print_access_listing(listing: &AccessListing, own_key: Option<&str>) {
    match listing {
        AccessListing::Implicit => {
            info("No access list recorded: the vault is readable by whoever last saved it.");
            tip("Run `memevault grant <NAME> <KEY>` to start recording recipients.");
        }
        AccessListing::Recorded(list) => print_recipients_table(list, own_key),
    }
}

fn print_recipients_table(list: &AccessList, own_key: Option<&str>) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Public Key", ""]);

    for r in list {
        let marker = if own_key == Some(r.public_key.as_str()) {
            style("you").green().to_string()
        } else {
            String::new()
        };
        table.add_row(vec![r.name.clone(), r.public_key.clone(), marker]);
    }

    println!(
        "{}",
        style(format!("{} recipient(s):", list.len())).bold()
    );
    println!("{table}");
}
