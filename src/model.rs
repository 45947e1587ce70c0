use std::fs;
use std::path::Path;
use std::sync::Mutex;

use tensorflow::{
    Graph, ImportGraphDefOptions, Operation, Session, SessionOptions, SessionRunArgs, Status,
    Tensor,
};
use tracing::info;

use crate::classifier::Classifier;
use crate::error::{Error, Result};
use crate::preprocess::ImageTensor;

/// Frozen TensorFlow graph exported from the trained disease CNN.
pub struct TfModel {
    inner: Mutex<Inner>,
}

struct Inner {
    session: Session,
    // the session must not outlive its graph
    _graph: Graph,
    input: Operation,
    output: Operation,
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Error::Model(status.to_string())
    }
}

impl TfModel {
    pub fn load(model_path: impl AsRef<Path>, input_op: &str, output_op: &str) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model_bytes = fs::read(model_path)?;

        let mut graph = Graph::new();
        graph.import_graph_def(&model_bytes, &ImportGraphDefOptions::new())?;

        let input = graph.operation_by_name_required(input_op)?;
        let output = graph.operation_by_name_required(output_op)?;
        let session = Session::new(&SessionOptions::new(), &graph)?;

        info!(path = %model_path.display(), input_op, output_op, "loaded frozen graph");
        Ok(Self {
            inner: Mutex::new(Inner {
                session,
                _graph: graph,
                input,
                output,
            }),
        })
    }
}

impl Classifier for TfModel {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>> {
        let tensor = Tensor::<f32>::new(&input.dims()).with_values(&input.data)?;

        let inner = self
            .inner
            .lock()
            .map_err(|_| Error::Model("session lock poisoned".into()))?;

        let mut args = SessionRunArgs::new();
        args.add_feed(&inner.input, 0, &tensor);
        let token = args.request_fetch(&inner.output, 0);
        inner.session.run(&mut args)?;

        let output: Tensor<f32> = args.fetch(token)?;
        Ok(output.to_vec())
    }
}
