use uuid::Uuid;

/// Resultado de una ejecución junto con el último contexto conocido.
///
/// `context` siempre está presente en caso de éxito. En caso de falla está
/// presente si el último contexto producido antes de la falla ya tenía el
/// tipo final `C` (ningún step de contexto posterior habría cambiado su
/// tipo) y la falla no fue un panic.
#[derive(Debug)]
pub struct RunOutcome<V, C, E> {
    pub run_id: Uuid,
    pub result: Result<V, E>,
    pub context: Option<C>,
}

impl<V, C, E> RunOutcome<V, C, E> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<V, E> {
        self.result
    }

    pub fn into_parts(self) -> (Result<V, E>, Option<C>) {
        (self.result, self.context)
    }
}
