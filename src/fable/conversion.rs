use super::definition::FableDocument;
use crate::error::BuilderError;

/// A trait for models that can be turned back into a fable document.
///
/// This is the way back from a rendered representation (for example the
/// node and edge lists of a graph canvas) to the document the store owns.
///
/// # Example
///
/// ```rust
/// use fable_builder::prelude::*;
/// use fable_builder::error::BuilderError;
///
/// struct Chain(Vec<(String, BlockFactoryId)>);
///
/// impl IntoFable for Chain {
///     fn into_fable(self) -> Result<FableDocument, BuilderError> {
///         let mut fable = FableDocument::new();
///         let mut previous: Option<String> = None;
///         for (id, factory_id) in self.0 {
///             let mut block = BlockInstance::new(factory_id);
///             if let Some(source) = previous.replace(id.clone()) {
///                 block.input_ids.insert("dataset".to_string(), source);
///             }
///             fable.blocks.insert(id, block);
///         }
///         Ok(fable)
///     }
/// }
///
/// let chain = Chain(vec![
///     ("source1".to_string(), BlockFactoryId::new("ecmwf", "ekdSource")),
///     ("sink1".to_string(), BlockFactoryId::new("ecmwf", "zarrSink")),
/// ]);
/// let fable = chain.into_fable().unwrap();
/// assert_eq!(fable.connection_count(), 1);
/// ```
pub trait IntoFable {
    /// Consumes the object and converts it into a fable document.
    fn into_fable(self) -> Result<FableDocument, BuilderError>;
}
