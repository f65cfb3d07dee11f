//! Similarity test console.
//!
//! A developer utility for exercising the position-similarity measures
//! outside of search: `auto` batch-compares consecutive FENs from a test
//! set and exports one CSV row per pair, `man` compares two entered FENs
//! under a chosen measure, `child` lists a position's one-ply successors
//! with their keys, `exit` leaves the console.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use engine_core::Rules;
use mcts::{similarity_fen, SimMethod, INVALID_FEN};
use tracing::debug;

/// The interactive similarity console.
pub struct SimilarityTester<R: Rules> {
    rules: R,
    data_dir: PathBuf,
}

impl<R: Rules> SimilarityTester<R> {
    /// `data_dir` holds `test_set.in` and receives the result files.
    pub fn new(rules: R, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules,
            data_dir: data_dir.into(),
        }
    }

    /// Command loop: `auto`, `man`, `child`, `exit`.
    pub fn run<I: BufRead, W: Write>(&self, input: I, out: &mut W) -> io::Result<()> {
        let mut lines = input.lines();
        while let Some(line) = lines.next() {
            match line?.trim() {
                "exit" => break,
                "auto" => self.auto_test(out)?,
                "man" => self.manual_test(&mut lines, out)?,
                "child" => self.child_test(&mut lines, out)?,
                "" => {}
                _ => writeln!(out, "[ERROR] Invalid command.")?,
            }
        }
        Ok(())
    }

    /// Batch test: read `test_set.in`, emit `result_<timestamp>.csv`.
    ///
    /// The input format is repeated groups of a position count followed by
    /// that many FEN lines; consecutive positions within a group form the
    /// compared pairs. A count below 2 ends the run.
    fn auto_test<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let input_path = self.data_dir.join("test_set.in");
        let content = match fs::read_to_string(&input_path) {
            Ok(content) => content,
            Err(_) => {
                writeln!(out, "[ERROR] Unable to open the required file(s).")?;
                return Ok(());
            }
        };

        let result_path = self
            .data_dir
            .join(format!("result_{}.csv", Local::now().format("%d_%m_%Y__%H_%M_%S")));
        let mut result = match fs::File::create(&result_path) {
            Ok(file) => file,
            Err(_) => {
                writeln!(out, "[ERROR] Unable to open the required file(s).")?;
                return Ok(());
            }
        };

        writeln!(
            result,
            "CONSTANT,DEPTH_BREADTH,INFL_PIECES,LEGAL_MOVES,REC_LEGAL_MOVES,\
             EXPANDABLE_STATES,REC_EXPANDABLE_STATES,trap_presence"
        )?;

        let mut lines = content.lines();
        'groups: while let Some(count_line) = lines.next() {
            let count: i64 = count_line.trim().parse().unwrap_or(0);
            if count < 2 {
                break;
            }

            let mut prev: Option<String> = None;
            for _ in 0..count {
                let Some(cur) = lines.next() else {
                    break 'groups;
                };
                if let Some(prev_fen) = &prev {
                    let mut row = String::new();
                    for method in SimMethod::ALL {
                        let sim = similarity_fen(method, &self.rules, cur, prev_fen);
                        row.push_str(&format!("{sim:.6},"));
                    }
                    row.push_str(self.trap_label(cur, prev_fen));
                    writeln!(result, "{row}")?;
                }
                prev = Some(cur.to_string());
            }
            writeln!(result)?;
        }

        debug!(path = %result_path.display(), "similarity batch finished");
        writeln!(
            out,
            "[INFO] Results of automatic tests exported to: {}",
            result_path.display()
        )
    }

    /// Interactive test: measure key, then two FENs.
    fn manual_test<I: BufRead, W: Write>(
        &self,
        lines: &mut io::Lines<I>,
        out: &mut W,
    ) -> io::Result<()> {
        loop {
            writeln!(out, "[INFO] Select similarity measure key (or '9' to quit):")?;
            writeln!(out, "   Name                  |key")?;
            writeln!(out, "   -------------------------")?;
            writeln!(out, "   CONSTANT              | 0")?;
            writeln!(out, "   DEPTH_BREADTH         | 1")?;
            writeln!(out, "   INFL_PIECES           | 2")?;
            writeln!(out, "   LEGAL_MOVES           | 3")?;
            writeln!(out, "   REC_LEGAL_MOVES       | 4")?;
            writeln!(out, "   EXPANDABLE_STATES     | 5")?;
            writeln!(out, "   REC_EXPANDABLE_STATES | 6")?;

            let Some(key_line) = lines.next() else {
                return Ok(());
            };
            let key_line = key_line?;
            let key = key_line.trim();
            if key == "9" {
                return Ok(());
            }
            let Some(method) = key.parse::<u32>().ok().and_then(SimMethod::from_key) else {
                writeln!(out, "[ERROR] Invalid similarity key")?;
                continue;
            };

            writeln!(out, "[INFO] Enter FEN one: ")?;
            let Some(fen1) = lines.next() else {
                return Ok(());
            };
            writeln!(out, "[INFO] Enter FEN two: ")?;
            let Some(fen2) = lines.next() else {
                return Ok(());
            };

            let sim = similarity_fen(method, &self.rules, fen1?.trim(), fen2?.trim());
            if sim == INVALID_FEN {
                writeln!(out, "[ERROR] Invalid FEN position(s).")?;
                return Ok(());
            }
            writeln!(out, "[INFO] Similarity is: {sim:.6}")?;
            writeln!(out)?;
        }
    }

    /// List a position's one-ply successors with their keys.
    fn child_test<I: BufRead, W: Write>(
        &self,
        lines: &mut io::Lines<I>,
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(out, "[INFO] Enter FEN: ")?;
        let Some(fen) = lines.next() else {
            return Ok(());
        };
        let pos = self.rules.parse_fen(fen?.trim());
        if self.rules.key(&pos) == 0 {
            return writeln!(out, "[ERROR] Invalid FEN position(s).");
        }

        for mv in self.rules.legal_moves(&pos) {
            let child = self.rules.apply(&pos, mv);
            writeln!(
                out,
                "{} {:016x}",
                self.rules.format_move(mv),
                self.rules.key(&child)
            )?;
        }
        Ok(())
    }

    /// Where the trap persists between the two positions: in `both`, only
    /// `fen1`, only `fen2`, or `none`.
    fn trap_label(&self, fen1: &str, fen2: &str) -> &'static str {
        match (self.has_trap(fen1), self.has_trap(fen2)) {
            (true, true) => "both",
            (true, false) => "fen1",
            (false, true) => "fen2",
            (false, false) => "none",
        }
    }

    /// A position "has a trap" when at least one of its moves lands in a
    /// trap position.
    fn has_trap(&self, fen: &str) -> bool {
        let pos = self.rules.parse_fen(fen);
        self.rules.key(&pos) != 0 && !self.rules.trap_moves(&pos).is_empty()
    }
}

/// Find the result files a batch run produced under `dir`.
pub fn result_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("result_") && n.ends_with(".csv"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}
