use crate::constant::{LINE_SEPARATOR, WRAP_INDENT};
use crate::error::ParameterError;

/// What happens when a cell's value exceeds its column width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Over-long values are a caller error, detected during [`TextTable::add_row`].
    Truncate,
    /// Keep writing into the neighboring columns; resume on a fresh line when the row ends.
    Span,
    /// Break at word boundaries and continue inside this column on successive lines.
    Wrap,
}

/// One column of a [`TextTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub width: usize,
    pub indent: usize,
    pub overflow: Overflow,
}

impl Column {
    pub fn new(width: usize, indent: usize, overflow: Overflow) -> Self {
        Self {
            width,
            indent,
            overflow,
        }
    }
}

/// A fixed-column text layout engine.
///
/// Rows are logical: one [`TextTable::add_row`] call may emit several output lines when a
/// cell overflows.  A value begins at its column's `start + indent`, never left of content
/// already on the line; once any cell of the row has overflowed onto an extra line, the
/// remaining cells each start on a fresh line of their own.  Output lines are right-padded
/// to the table width so columns stay aligned when piped.
#[derive(Debug)]
pub struct TextTable {
    columns: Vec<Column>,
    starts: Vec<usize>,
    total: usize,
    wrap_indent: usize,
    rows: Vec<Vec<char>>,
}

impl TextTable {
    pub fn new(columns: Vec<Column>) -> Self {
        let mut starts = Vec::default();
        let mut total = 0;

        for column in &columns {
            starts.push(total);
            total += column.width;
        }

        Self {
            columns,
            starts,
            total,
            wrap_indent: WRAP_INDENT,
            rows: Vec::default(),
        }
    }

    /// The seven-column layout of the option-details help, 80 characters wide overall.
    pub fn default_option_columns() -> Vec<Column> {
        vec![
            Column::new(2, 2, Overflow::Span),
            Column::new(2, 1, Overflow::Span),
            Column::new(1, 2, Overflow::Span),
            Column::new(3, 2, Overflow::Span),
            Column::new(1, 2, Overflow::Span),
            Column::new(20, 1, Overflow::Span),
            Column::new(51, 1, Overflow::Wrap),
        ]
    }

    /// Override the extra indentation of continuation lines.
    pub fn wrap_indent(mut self, wrap_indent: usize) -> Self {
        self.wrap_indent = wrap_indent;
        self
    }

    pub fn total_width(&self) -> usize {
        self.total
    }

    /// Write one logical row.  Trailing columns may be left unfilled, but supplying more
    /// values than columns, or overflowing a `Truncate` column, is a caller error.
    pub fn add_row<S: AsRef<str>>(&mut self, values: &[S]) -> Result<(), ParameterError> {
        if values.len() > self.columns.len() {
            return Err(ParameterError::illegal(format!(
                "cannot add a row with {} values to a table with {} columns",
                values.len(),
                self.columns.len()
            )));
        }

        for (index, value) in values.iter().enumerate() {
            let column = self.columns[index];

            if column.overflow == Overflow::Truncate
                && value.as_ref().chars().count() > column.width
            {
                return Err(ParameterError::illegal(format!(
                    "value '{}' exceeds the width {} of column {index}",
                    value.as_ref(),
                    column.width
                )));
            }
        }

        self.rows.push(vec![' '; self.total]);
        let mut spilled = false;

        for (index, value) in values.iter().enumerate() {
            let value = value.as_ref();

            if value.is_empty() {
                continue;
            }

            if spilled {
                self.rows.push(vec![' '; self.total]);
                spilled = false;
            }

            match self.columns[index].overflow {
                Overflow::Truncate => {
                    let pos = self.starts[index] + self.columns[index].indent;
                    let row = self.rows.len() - 1;
                    let text: Vec<char> = value.chars().collect();
                    self.write_at(row, pos, &text);
                }
                Overflow::Span => {
                    spilled = self.write_span(index, value);
                }
                Overflow::Wrap => {
                    spilled = self.write_wrap(index, value);
                }
            }
        }

        Ok(())
    }

    /// The rendered lines, each exactly `total_width` characters.
    pub fn lines(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.iter().collect()).collect()
    }

    fn content_end(row: &[char]) -> usize {
        row.iter()
            .rposition(|current| *current != ' ')
            .map(|position| position + 1)
            .unwrap_or(0)
    }

    fn write_at(&mut self, row: usize, pos: usize, text: &[char]) {
        for (offset, current) in text.iter().enumerate() {
            if pos + offset < self.total {
                self.rows[row][pos + offset] = *current;
            }
        }
    }

    fn blank_row(&mut self) -> usize {
        self.rows.push(vec![' '; self.total]);
        self.rows.len() - 1
    }

    fn write_span(&mut self, index: usize, value: &str) -> bool {
        let column = self.columns[index];
        let base = self.starts[index] + column.indent;
        let continuation = (base + self.wrap_indent).min(self.total.saturating_sub(1));
        let mut row = self.rows.len() - 1;
        let mut pos = std::cmp::max(base, Self::content_end(&self.rows[row]));
        let mut rest: Vec<char> = value.chars().collect();
        let mut extra = false;

        loop {
            let available = self.total.saturating_sub(pos);

            if rest.len() <= available {
                self.write_at(row, pos, &rest);
                break;
            }

            let (head_end, tail_start) = break_chunk(&rest, available);
            let head: Vec<char> = rest[..head_end].to_vec();
            self.write_at(row, pos, &head);
            rest = rest[tail_start..].to_vec();

            row = self.blank_row();
            extra = true;
            pos = continuation;
        }

        extra
    }

    fn write_wrap(&mut self, index: usize, value: &str) -> bool {
        let column = self.columns[index];
        let start = self.starts[index];
        let region_end = start + column.width;
        let base = start + column.indent;
        let continuation = (base + self.wrap_indent).min(region_end.saturating_sub(1));
        let mut row = self.rows.len() - 1;
        let mut pos = std::cmp::max(base, Self::content_end(&self.rows[row]));
        let mut extra = false;

        if pos >= region_end {
            row = self.blank_row();
            extra = true;
            pos = base;
        }

        let mut rest: Vec<char> = value.chars().collect();

        loop {
            let available = region_end - pos;

            if rest.len() <= available {
                self.write_at(row, pos, &rest);
                break;
            }

            let (head_end, tail_start) = break_chunk(&rest, available);
            let head: Vec<char> = rest[..head_end].to_vec();
            self.write_at(row, pos, &head);
            rest = rest[tail_start..].to_vec();

            row = self.blank_row();
            extra = true;
            pos = continuation;
        }

        extra
    }
}

impl std::fmt::Display for TextTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in self.lines() {
            f.write_str(&line)?;
            f.write_str(LINE_SEPARATOR)?;
        }

        Ok(())
    }
}

/// Split an over-long chunk: prefer the right-most whitespace whose prefix still fits,
/// falling back to a hard cut when one word exceeds the whole window.
fn break_chunk(rest: &[char], available: usize) -> (usize, usize) {
    let limit = available.min(rest.len().saturating_sub(1));

    for position in (1..=limit).rev() {
        if rest[position] == ' ' {
            let mut tail_start = position;

            while tail_start < rest.len() && rest[tail_start] == ' ' {
                tail_start += 1;
            }

            return (position, tail_start);
        }
    }

    (available, available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn default_table() -> TextTable {
        TextTable::new(TextTable::default_option_columns())
    }

    #[test]
    fn geometry() {
        let table = default_table();
        assert_eq!(table.total_width(), 80);
    }

    #[test]
    fn simple_option_row() {
        let mut table = default_table();
        table
            .add_row(&["-c", ",", "--create <file>", "", "", "", "Creates a file."])
            .unwrap();

        let lines = table.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            format!("{:<80}", "  -c, --create <file>         Creates a file.")
        );
    }

    #[test]
    fn spanning_name_list_wraps_and_pushes_the_description_down() {
        let mut table = default_table();
        table
            .add_row(&[
                "-c",
                ",",
                "--create, --create2, --create3, --create4, --create5, --create6, --create7, --create8",
                "description",
            ])
            .unwrap();

        let lines = table.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0].trim_end(),
            "  -c, --create, --create2, --create3, --create4, --create5, --create6,"
        );
        assert_eq!(lines[1].trim_end(), "          --create7, --create8");
        assert_eq!(lines[2].trim_end(), "       description");
    }

    #[test]
    fn description_wraps_within_its_column() {
        let mut table = default_table();
        let description = vec!["wrap"; 12].join(" ");
        table
            .add_row(&["", "", "", "", "", "", description.as_str()])
            .unwrap();

        let lines = table.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].trim_end(),
            format!("{}{}", " ".repeat(30), vec!["wrap"; 10].join(" "))
        );
        assert_eq!(
            lines[1].trim_end(),
            format!("{}{}", " ".repeat(34), vec!["wrap"; 2].join(" "))
        );
    }

    #[test]
    fn lines_are_right_padded() {
        let mut table = default_table();
        table.add_row(&["-c", "", "", "", "", "", "tiny"]).unwrap();

        for line in table.lines() {
            assert_eq!(line.chars().count(), 80);
        }
    }

    #[test]
    fn too_many_values() {
        let mut table = default_table();
        let result = table.add_row(&["a", "b", "c", "d", "e", "f", "g", "h"]);

        assert_matches!(result, Err(ParameterError::IllegalArgumentUsage { .. }));
    }

    #[test]
    fn truncate_overflow_is_a_caller_error() {
        let mut table = TextTable::new(vec![
            Column::new(4, 0, Overflow::Truncate),
            Column::new(76, 1, Overflow::Wrap),
        ]);

        table.add_row(&["abcd", "ok"]).unwrap();
        let result = table.add_row(&["abcde", "ok"]);

        assert_matches!(result, Err(ParameterError::IllegalArgumentUsage { .. }));
    }

    #[test]
    fn under_filled_rows_are_legal() {
        let mut table = default_table();
        table.add_row(&["-v"]).unwrap();

        let lines = table.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].trim_end(), "  -v");
    }

    #[test]
    fn hard_break_for_unbreakable_words() {
        let mut table = TextTable::new(vec![Column::new(10, 0, Overflow::Wrap)]).wrap_indent(0);
        table.add_row(&["abcdefghijklmnop"]).unwrap();

        let lines = table.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].trim_end(), "abcdefghij");
        assert_eq!(lines[1].trim_end(), "klmnop");
    }

    #[test]
    fn display_joins_lines() {
        let mut table = default_table();
        table.add_row(&["-v", "", "", "", "", "", "Verbose."]).unwrap();

        let rendered = table.to_string();
        assert!(rendered.ends_with(crate::constant::LINE_SEPARATOR));
        crate::test::assert_contains!(rendered, "-v");
    }
}
