use crate::buffer::{Buffer, BufferError};

/// One inverse replacement: put `text` back over `[offset, offset + length)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoStep {
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

/// Inverse of an executed run, recorded replacement by replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "an UndoLog does nothing until apply() is called"]
pub struct UndoLog {
    steps: Vec<UndoStep>,
}

impl UndoLog {
    pub fn steps(&self) -> &[UndoStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Restore the buffer to its state before the recorded run.
    pub fn apply<B: Buffer + ?Sized>(&self, buffer: &mut B) -> Result<(), BufferError> {
        for step in self.steps.iter().rev() {
            buffer.replace(step.offset, step.length, &step.text)?;
        }
        Ok(())
    }
}

/// Buffer wrapper that remembers what every replacement overwrote.
pub(crate) struct UndoRecorder<'b, B: Buffer + ?Sized> {
    inner: &'b mut B,
    steps: Vec<UndoStep>,
}

impl<'b, B: Buffer + ?Sized> UndoRecorder<'b, B> {
    pub(crate) fn new(inner: &'b mut B) -> Self {
        Self {
            inner,
            steps: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> UndoLog {
        UndoLog { steps: self.steps }
    }
}

impl<B: Buffer + ?Sized> Buffer for UndoRecorder<'_, B> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn text(&self, offset: usize, length: usize) -> Result<String, BufferError> {
        self.inner.text(offset, length)
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<(), BufferError> {
        let previous = self.inner.text(offset, length)?;
        self.inner.replace(offset, length, text)?;
        self.steps.push(UndoStep {
            offset,
            length: text.len(),
            text: previous,
        });
        Ok(())
    }
}
