//! Interactive Menu
//!
//! Line-oriented loop over the catalog. Input and output are generic so the
//! loop can be driven from tests; the catalog is rediscovered every round so
//! freshly built native binaries show up after `b`.

use crate::catalog::{Catalog, Example};
use crate::runner::Actions;
use std::io::{BufRead, Write};

fn print_section(
    out: &mut impl Write,
    title: &str,
    examples: &[Example],
    first: usize,
    empty_note: Option<&str>,
) -> std::io::Result<()> {
    writeln!(out, "\n{}:", title)?;
    if examples.is_empty() {
        if let Some(note) = empty_note {
            writeln!(out, "  {}", note)?;
        }
    }
    for (i, example) in examples.iter().enumerate() {
        writeln!(out, "  {}. {}", first + i, example.stem)?;
    }
    Ok(())
}

fn print_menu(out: &mut impl Write, catalog: &Catalog) -> std::io::Result<()> {
    writeln!(out, "\n{}", "=".repeat(60))?;
    writeln!(out, "cpuprof - NVIDIA Nsight Systems CPU Profiling Runner")?;
    writeln!(out, "{}", "=".repeat(60))?;

    let mut next = 1;
    print_section(out, "Rust Examples", &catalog.builtins, next, None)?;
    next += catalog.builtins.len();
    print_section(out, "Python Examples", &catalog.scripts, next, None)?;
    next += catalog.scripts.len();
    print_section(
        out,
        "C++ Examples",
        &catalog.binaries,
        next,
        Some("(Not built yet - use 'b' to build)"),
    )?;

    writeln!(out, "\nOptions:")?;
    writeln!(out, "  p: Run with profiling")?;
    writeln!(out, "  b: Build C++ examples")?;
    writeln!(out, "  a: Run all examples")?;
    writeln!(out, "  q: Quit")?;
    write!(out, "\nEnter choice (number or letter): ")?;
    out.flush()
}

/// Read one trimmed line; `None` at end of input
fn read_choice(input: &mut impl BufRead) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_lowercase()))
}

fn run_numbered(
    out: &mut impl Write,
    catalog: &Catalog,
    actions: &mut impl Actions,
    choice: &str,
    profile: bool,
) -> anyhow::Result<()> {
    // Any integer is a menu number; negative ones just match no example
    let Ok(number) = choice.parse::<i64>() else {
        writeln!(out, "Invalid input!")?;
        return Ok(());
    };
    let example = usize::try_from(number)
        .ok()
        .and_then(|index| catalog.select(index));
    match example {
        Some(example) => {
            if let Err(e) = actions.run(example, profile) {
                tracing::warn!("{} failed: {}", example.profile_name(), e);
            }
        }
        None => writeln!(out, "Invalid example number!")?,
    }
    Ok(())
}

/// Run the menu until `q` or end of input
pub fn run_menu<A, R, W>(
    discover: impl Fn() -> Catalog,
    actions: &mut A,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<()>
where
    A: Actions,
    R: BufRead,
    W: Write,
{
    loop {
        let catalog = discover();
        print_menu(out, &catalog)?;

        let Some(choice) = read_choice(input)? else {
            writeln!(out)?;
            break;
        };

        match choice.as_str() {
            "q" => break,
            "b" => {
                if let Err(e) = actions.build() {
                    tracing::warn!("Build failed: {}", e);
                }
            }
            "a" => {
                let all: Vec<&Example> = catalog.all().collect();
                if let Err(e) = actions.run_all(&all) {
                    tracing::warn!("Run all failed: {}", e);
                }
            }
            "p" => {
                write!(out, "Enter example number to profile: ")?;
                out.flush()?;
                let Some(number) = read_choice(input)? else {
                    writeln!(out)?;
                    break;
                };
                run_numbered(out, &catalog, actions, &number, true)?;
            }
            other => run_numbered(out, &catalog, actions, other, false)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CpuprofConfig;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        runs: Vec<(String, bool)>,
        run_all: usize,
        builds: usize,
    }

    impl Actions for Recorder {
        fn run(&mut self, example: &Example, profile: bool) -> anyhow::Result<()> {
            self.runs.push((example.profile_name(), profile));
            Ok(())
        }

        fn run_all(&mut self, examples: &[&Example]) -> anyhow::Result<()> {
            self.run_all += examples.len();
            Ok(())
        }

        fn build(&mut self) -> anyhow::Result<()> {
            self.builds += 1;
            Ok(())
        }
    }

    fn drive(script: &str) -> (Recorder, String) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CpuprofConfig::default();
        config.paths.python_dir = dir.path().join("python");
        config.paths.native_bin_dir = dir.path().join("bin");

        let mut recorder = Recorder::default();
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        run_menu(
            || Catalog::discover(&config),
            &mut recorder,
            &mut input,
            &mut output,
        )
        .unwrap();
        (recorder, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_menu_lists_and_quits() {
        let (rec, out) = drive("q\n");
        assert!(out.contains("Rust Examples:"));
        assert!(out.contains("  1. 1_basic_cpu"));
        assert!(out.contains("(Not built yet - use 'b' to build)"));
        assert!(out.contains("  p: Run with profiling"));
        assert!(rec.runs.is_empty());
    }

    #[test]
    fn test_menu_dispatch() {
        let (rec, out) = drive("2\np\n3\nb\na\n99\nxyz\np\nabc\nq\n");
        assert_eq!(
            rec.runs,
            vec![
                ("rs_2_matrix_ops".to_string(), false),
                ("rs_3_parallel".to_string(), true),
            ]
        );
        assert_eq!(rec.builds, 1);
        assert_eq!(rec.run_all, 6);
        assert_eq!(out.matches("Invalid example number!").count(), 1);
        assert_eq!(out.matches("Invalid input!").count(), 2);
    }

    #[test]
    fn test_menu_out_of_range_numbers() {
        let (rec, out) = drive("-1\n0\n-99999999999\n1.5\nq\n");
        assert!(rec.runs.is_empty());
        assert_eq!(out.matches("Invalid example number!").count(), 3);
        assert_eq!(out.matches("Invalid input!").count(), 1);
    }

    #[test]
    fn test_menu_ends_on_eof() {
        let (rec, out) = drive("1\n");
        assert_eq!(rec.runs.len(), 1);
        // Menu shown twice: once before "1", once before EOF
        assert_eq!(out.matches("Enter choice").count(), 2);
    }
}
