use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    vectorizer::{tfidf::TFIDFEngine, CorpusModel, Vectorizer, Vocabulary},
};

/// Vectorizerのシリアライズ用のデータ構造
/// The vocabulary is stored in its trained order and is never rebuilt on load,
/// so weight columns keep their meaning across a save/load cycle.
/// `into_vectorizer`メソッドを使用して、`Vectorizer`に変換できます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TFIDFData {
    /// 語彙 (学習順)
    pub vocabulary: Vocabulary,
    /// IDFベクトル
    pub idf: Vec<f64>,
    /// ドキュメントの重みベクトル
    pub weights: Vec<Vec<f64>>,
}

impl TFIDFData {
    /// `TFIDFData`から`Vectorizer`に変換します。
    /// The shape is checked before anything is built.
    pub fn into_vectorizer<E>(self) -> Result<Vectorizer<E>>
    where
        E: TFIDFEngine,
    {
        let model = CorpusModel::from_parts(self.vocabulary, self.idf, self.weights)?;
        Ok(Vectorizer::from_model(model))
    }
}

impl<E> Vectorizer<E>
where
    E: TFIDFEngine,
{
    /// Copy the model into its serializable form
    pub fn to_data(&self) -> TFIDFData {
        TFIDFData {
            vocabulary: self.model.vocabulary.clone(),
            idf: self.model.idf.clone(),
            weights: self.model.weights.clone(),
        }
    }
}
