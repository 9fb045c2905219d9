//! Regex rewrites that add `logger.error` calls to bare `except` handlers
//! in a Flask application source file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use regex::{NoExpand, Regex};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_TARGET: &str = "app.py";

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid rewrite rule '{name}': {source}")]
    InvalidRule {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// One ordered rewrite
#[derive(Debug, Clone, Copy)]
pub struct PatchRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
    /// Replacement is literal text rather than a `$n` template
    pub literal: bool,
    /// Counts one fix when matched, instead of one per match
    pub counts_once: bool,
}

/// Handler rewrites, applied in order
pub const HANDLER_RULES: [PatchRule; 5] = [
    PatchRule {
        name: "comment, flash, rollback",
        pattern: r"except Exception as e:\s*\n(\s*)# ([^\n]+)\n(\s*)flash\(([^\n]+)\)\n(\s*)db\.session\.rollback\(\)",
        replacement: "except Exception as e:\n${1}# ${2}\n${1}logger.error(f\"خطأ: {str(e)}\")\n${3}flash(${4})\n${5}db.session.rollback()",
        literal: false,
        counts_once: false,
    },
    PatchRule {
        name: "flash, rollback",
        pattern: r"except Exception as e:\s*\n(\s*)flash\(([^\n]+)\)\n(\s*)db\.session\.rollback\(\)",
        replacement: "except Exception as e:\n${1}logger.error(f\"خطأ: {str(e)}\")\n${1}flash(${2})\n${3}db.session.rollback()",
        literal: false,
        counts_once: false,
    },
    PatchRule {
        name: "comment, render_template",
        pattern: r"except Exception as e:\s*\n(\s*)# ([^\n]+)\n(\s*)return render_template\(([^\n]+)\)",
        replacement: "except Exception as e:\n${1}# ${2}\n${1}logger.error(f\"خطأ: {str(e)}\")\n${3}return render_template(${4})",
        literal: false,
        counts_once: false,
    },
    PatchRule {
        name: "render_template",
        pattern: r"except Exception as e:\s*\n(\s*)return render_template\(([^\n]+)\)",
        replacement: "except Exception as e:\n${1}logger.error(f\"خطأ: {str(e)}\")\n${1}return render_template(${2})",
        literal: false,
        counts_once: false,
    },
    PatchRule {
        name: "flash, redirect",
        pattern: r"except Exception as e:\s*\n(\s*)flash\(([^\n]+)\)\n(\s*)return redirect\(([^\n]+)\)",
        replacement: "except Exception as e:\n${1}logger.error(f\"خطأ: {str(e)}\")\n${1}flash(${2})\n${3}return redirect(${4})",
        literal: false,
        counts_once: false,
    },
];

/// Invoice-creation fixes; `.` also matches newlines here
pub const SPECIAL_RULES: [PatchRule; 2] = [
    PatchRule {
        name: "unused notes variable",
        pattern: r"(?ms)notes = request\.form\.get\('notes'\)\s*\n\s*new_invoice = Invoice\(",
        replacement: "new_invoice = Invoice(",
        literal: true,
        counts_once: true,
    },
    PatchRule {
        name: "pass notes to invoice",
        pattern: r"(?ms)new_invoice = Invoice\(\s*customer_name=customer_name,\s*total_amount=total_amount,\s*date=datetime\.strptime\(invoice_date, '%Y-%m-%d'\) if invoice_date else datetime\.now\(\)\s*\)",
        replacement: "notes = request.form.get('notes')
            new_invoice = Invoice(
                customer_name=customer_name,
                total_amount=total_amount,
                date=datetime.strptime(invoice_date, '%Y-%m-%d') if invoice_date else datetime.now(),
                notes=notes
            )",
        literal: true,
        counts_once: true,
    },
];

/// What a single rule did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub rule: &'static str,
    pub fixes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub content: String,
    pub fixes: usize,
    pub applied: Vec<RuleOutcome>,
    /// New lines with their 1-based line numbers in `content`
    pub added: Vec<(usize, String)>,
}

impl PatchOutcome {
    pub fn changed(&self, original: &str) -> bool {
        self.content != original
    }
}

impl PatchRule {
    fn compile(&self) -> Result<Regex, PatchError> {
        Regex::new(self.pattern).map_err(|source| PatchError::InvalidRule {
            name: self.name,
            source,
        })
    }

    /// Applies the rule, returning the new text and the number of fixes
    pub fn apply(&self, content: &str) -> Result<(String, usize), PatchError> {
        let re = self.compile()?;
        let matches = re.find_iter(content).count();
        if matches == 0 {
            return Ok((content.to_string(), 0));
        }

        let rewritten = if self.literal {
            re.replace_all(content, NoExpand(self.replacement))
        } else {
            re.replace_all(content, self.replacement)
        };
        let fixes = if self.counts_once { 1 } else { matches };
        Ok((rewritten.into_owned(), fixes))
    }
}

/// Lines of `patched` that are not in `original`, numbered from 1
pub fn added_lines(original: &str, patched: &str) -> Vec<(usize, String)> {
    let before: Vec<&str> = original.lines().collect();
    let after: Vec<&str> = patched.lines().collect();
    let mut added = Vec::new();
    let (mut i, mut j) = (0, 0);

    while j < after.len() {
        if i < before.len() && before[i] == after[j] {
            i += 1;
            j += 1;
            continue;
        }
        // Inserted lines run until the next original line reappears
        let resumes = before
            .get(i)
            .and_then(|line| after[j..].iter().position(|l| l == line));
        match resumes {
            Some(offset) => {
                for k in j..j + offset {
                    added.push((k + 1, after[k].to_string()));
                }
                j += offset;
            }
            None => {
                added.push((j + 1, after[j].to_string()));
                i += 1;
                j += 1;
            }
        }
    }
    added
}

/// Runs the handler rules then the special fixes over `content`
pub fn apply_rules(content: &str) -> Result<PatchOutcome, PatchError> {
    let mut current = content.to_string();
    let mut applied = Vec::new();
    let mut fixes = 0;

    for rule in HANDLER_RULES.iter().chain(SPECIAL_RULES.iter()) {
        let (next, count) = rule.apply(&current)?;
        if count > 0 {
            debug!(rule = rule.name, count, "rule matched");
            applied.push(RuleOutcome {
                rule: rule.name,
                fixes: count,
            });
        }
        fixes += count;
        current = next;
    }

    Ok(PatchOutcome {
        added: added_lines(content, &current),
        content: current,
        fixes,
        applied,
    })
}

/// Patches `path` in place; with `dry_run` the file is left untouched.
pub fn patch_file(path: &Path, dry_run: bool) -> Result<PatchOutcome, PatchError> {
    if !path.exists() {
        return Err(PatchError::NotFound(path.to_path_buf()));
    }
    let original = fs::read_to_string(path).map_err(|source| PatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let outcome = apply_rules(&original)?;

    if dry_run {
        info!(path = %path.display(), fixes = outcome.fixes, "dry run, file not written");
    } else if outcome.changed(&original) {
        fs::write(path, &outcome.content).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), fixes = outcome.fixes, "file patched");
    } else {
        info!(path = %path.display(), "nothing to fix");
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LOG_LINE: &str = r#"logger.error(f"خطأ: {str(e)}")"#;

    const FLASH_ROLLBACK: &str = "    try:
        db.session.commit()
    except Exception as e:
        flash('حدث خطأ', 'error')
        db.session.rollback()
";

    #[test]
    fn every_rule_compiles() {
        for rule in HANDLER_RULES.iter().chain(SPECIAL_RULES.iter()) {
            assert!(rule.compile().is_ok(), "{} failed to compile", rule.name);
        }
    }

    #[test]
    fn inserts_log_line_at_handler_indentation() {
        let outcome = apply_rules(FLASH_ROLLBACK).unwrap();
        assert_eq!(outcome.fixes, 1);
        assert_eq!(outcome.content.matches(LOG_LINE).count(), 1);
        assert!(outcome
            .content
            .contains(&format!("    except Exception as e:\n        {}\n        flash(", LOG_LINE)));
    }

    #[test]
    fn comment_line_keeps_its_place() {
        let source = "except Exception as e:
    # rollback on failure
    flash('خطأ')
    db.session.rollback()
";
        let outcome = apply_rules(source).unwrap();
        assert_eq!(outcome.fixes, 1);
        assert!(outcome.content.contains(&format!(
            "    # rollback on failure\n    {}\n    flash('خطأ')",
            LOG_LINE
        )));
    }

    #[test]
    fn each_handler_shape_is_fixed_once() {
        let source = "except Exception as e:
    return render_template('error.html')
except Exception as e:
    # show the form again
    return render_template('form.html', error=True)
except Exception as e:
    flash('خطأ')
    return redirect(url_for('index'))
";
        let outcome = apply_rules(source).unwrap();
        assert_eq!(outcome.fixes, 3);
        assert_eq!(outcome.content.matches(LOG_LINE).count(), 3);
    }

    #[test]
    fn patched_output_is_a_fixed_point() {
        let first = apply_rules(FLASH_ROLLBACK).unwrap();
        let second = apply_rules(&first.content).unwrap();
        assert_eq!(second.fixes, 0);
        assert_eq!(second.content, first.content);
    }

    #[test]
    fn unrelated_source_is_untouched() {
        let source = "def index():\n    return 'ok'\n";
        let outcome = apply_rules(source).unwrap();
        assert_eq!(outcome.fixes, 0);
        assert_eq!(outcome.content, source);
        assert!(!outcome.changed(source));
    }

    #[test]
    fn special_fixes_pass_notes_to_invoice() {
        let source = "            notes = request.form.get('notes')
            new_invoice = Invoice(
                customer_name=customer_name,
                total_amount=total_amount,
                date=datetime.strptime(invoice_date, '%Y-%m-%d') if invoice_date else datetime.now()
            )
";
        let outcome = apply_rules(source).unwrap();
        assert_eq!(outcome.fixes, 2);
        assert!(outcome.content.contains("notes=notes"));
        assert_eq!(outcome.content.matches("request.form.get('notes')").count(), 1);
    }

    #[test]
    fn added_lines_are_numbered_in_patched_text() {
        let outcome = apply_rules(FLASH_ROLLBACK).unwrap();
        assert_eq!(outcome.added, vec![(4, format!("        {}", LOG_LINE))]);
        assert!(apply_rules("x = 1\n").unwrap().added.is_empty());
        assert_eq!(
            added_lines("a\nb\n", "a\nc\nb\nd\n"),
            vec![(2, "c".to_string()), (4, "d".to_string())]
        );
    }

    #[test]
    fn added_lines_cover_every_handler_and_replaced_lines() {
        let source = format!("{}{}", FLASH_ROLLBACK, FLASH_ROLLBACK);
        let outcome = apply_rules(&source).unwrap();
        let added = &outcome.added;
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].0, 4);
        assert_eq!(added[1].0, 10);
        assert!(added.iter().all(|(_, line)| line.contains(LOG_LINE)));

        let source = "            notes = request.form.get('notes')
            new_invoice = Invoice(
                customer_name=customer_name,
                total_amount=total_amount,
                date=datetime.strptime(invoice_date, '%Y-%m-%d') if invoice_date else datetime.now()
            )
";
        let outcome = apply_rules(source).unwrap();
        let added = &outcome.added;
        assert!(added.iter().any(|(_, line)| line.trim() == "notes=notes"));
        for (number, line) in added.iter() {
            assert_eq!(outcome.content.lines().nth(number - 1), Some(line.as_str()));
        }
    }

    #[test]
    fn patch_file_rewrites_in_place() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FLASH_ROLLBACK.as_bytes()).unwrap();

        let outcome = patch_file(file.path(), false).unwrap();
        assert_eq!(outcome.fixes, 1);
        let written = fs::read_to_string(file.path()).unwrap();
        assert_eq!(written, outcome.content);
    }

    #[test]
    fn dry_run_leaves_file_alone() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FLASH_ROLLBACK.as_bytes()).unwrap();

        let outcome = patch_file(file.path(), true).unwrap();
        assert_eq!(outcome.fixes, 1);
        assert_eq!(fs::read_to_string(file.path()).unwrap(), FLASH_ROLLBACK);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("app.py");
        assert!(matches!(
            patch_file(&missing, false),
            Err(PatchError::NotFound(_))
        ));
    }
}
