//! Append-only text sink with an indentation level.

#[derive(Debug, Default)]
pub struct Printer {
    out: String,
    level: usize,
    width: usize,
}

impl Printer {
    pub fn new(width: usize) -> Self {
        Self {
            out: String::new(),
            level: 0,
            width,
        }
    }

    pub fn incr(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    pub fn decr(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    /// Write the current indentation.
    pub fn indent(&mut self) -> &mut Self {
        self.out.extend(std::iter::repeat(' ').take(self.level * self.width));
        self
    }

    /// Write `text` as is.
    pub fn p(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self
    }

    /// Write `text` and end the line.
    pub fn pln(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self.out.push('\n');
        self
    }

    /// An indented line.
    pub fn line(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self.newline();
        }
        self.indent().pln(text)
    }

    pub fn newline(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    /// An indented line, then one level deeper.
    pub fn open(&mut self, text: &str) -> &mut Self {
        self.line(text).incr()
    }

    /// One level shallower, then an indented line.
    pub fn close(&mut self, text: &str) -> &mut Self {
        self.decr().line(text)
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }
}
