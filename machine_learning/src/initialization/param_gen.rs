/// Source of initial values for a network's flat parameter buffer.
pub trait ParamGen {
    /// Draws the next `n` parameters.
    ///
    /// # Returns
    /// `None` once the generator cannot produce any more values.
    fn sample(&mut self, n: usize) -> Option<Vec<f32>>;
}
