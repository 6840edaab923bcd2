use agentmatch::{AnalysisDetails, AnalysisResult, UNKNOWN_VALUE};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// Field name prefixes shown as separate sections, in display order.
const GROUPS: [&str; 4] = ["Device", "OperatingSystem", "LayoutEngine", "Agent"];

pub fn print_result(input: &str, result: &AnalysisResult, field_names: &[String], color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Analyzing: \"{}\"", input), ansi::CYAN)));
    print_fields(result, field_names, &palette);
    println!();
}

pub fn print_details(details: &AnalysisDetails, field_names: &[String], color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Analyzing: \"{}\"", details.input), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Matchers ━━━", ansi::GRAY));
    println!(
        "  {} {}  {} {}",
        palette.dim("active:"),
        palette.paint(details.active_matchers.len().to_string(), ansi::BLUE),
        palette.dim("fired:"),
        palette.paint(details.fired.len().to_string(), ansi::GREEN),
    );
    if details.fired.is_empty() {
        println!("{}", palette.dim("  No matcher fired"));
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • Anchored matchers were skipped (their literals are not in the input)");
        println!("  • Guard chains failed on this tree");
        println!("\n{}", palette.dim("  Tip: Set AGENTMATCH_LOG=agentmatch=trace to see candidate selection"));
    }
    for fired in &details.fired {
        println!(
            "  {} {}",
            palette.paint(&fired.name, ansi::CYAN),
            palette.dim(format!("(priority {})", fired.priority)),
        );
        for (field, value) in &fired.emissions {
            println!("      {} {} {}", palette.paint(field, ansi::BLUE), palette.dim("="), value);
        }
    }

    print_fields(&details.result, field_names, &palette);

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Parse: {}  │  Scan: {}  │  Evaluate: {}  │  Resolve: {}",
        palette.paint(format!("{:?}", details.total), ansi::GREEN),
        palette.dim(format!("{:?}", details.parse)),
        palette.dim(format!("{:?}", details.scan)),
        palette.paint(format!("{:?}", details.evaluation), ansi::CYAN),
        palette.dim(format!("{:?}", details.resolve)),
    );
    println!();
}

fn print_fields(result: &AnalysisResult, field_names: &[String], palette: &ansi::Palette) {
    let width = field_names.iter().map(String::len).max().unwrap_or(0);

    let mut printed = vec![false; field_names.len()];
    for group in GROUPS.iter().copied().map(Some).chain(std::iter::once(None)) {
        let members: Vec<usize> = (0..field_names.len())
            .filter(|&i| !printed[i] && group.is_none_or(|prefix| field_names[i].starts_with(prefix)))
            .collect();
        if members.is_empty() {
            continue;
        }

        println!("\n{}", palette.paint(format!("━━━ {} ━━━", group.unwrap_or("Other")), ansi::GRAY));
        for i in members {
            printed[i] = true;
            let name = &field_names[i];
            let value = match result.get(name) {
                Some(field) => format!(
                    "{} {}",
                    palette.bold(palette.paint(&field.value, ansi::GREEN)),
                    palette.dim(format!("({})", field.confidence))
                ),
                None => palette.dim(UNKNOWN_VALUE),
            };
            println!("  {} {}", palette.paint(format!("{name:<width$}"), ansi::BLUE), value);
        }
    }
}
