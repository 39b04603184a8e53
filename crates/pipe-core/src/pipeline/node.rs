//! Nodo inmutable del pipeline (prefijo de pasos) con compartición estructural.
//!
//! Reglas al crear un hijo con un step nuevo:
//! - Si el nodo actual ya tiene `parent`, el hijo guarda sólo el step nuevo y
//!   apunta al nodo actual.
//! - Si el nodo no tiene `parent` y nadie ha derivado aún de él, el hijo copia
//!   la lista propia, agrega el step y tampoco tiene `parent` (cadena lineal,
//!   `flatten` O(1)).
//! - Si el nodo no tiene `parent` pero ya se derivó de él, es un punto de
//!   bifurcación: el hijo guarda sólo el step nuevo y apunta al nodo actual,
//!   compartiendo su historia con las demás ramas.
//!
//! Invariante: `flatten(n) == flatten(n.parent) ++ n.own_steps`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::trace;
use once_cell::sync::OnceCell;

use crate::step::{AnyValue, Step};

/// Fábrica de valores borrados (contexto inicial o valor sembrado). Se invoca
/// una vez por ejecución para que cada run tenga sus propios locales.
pub(crate) type ValueFactory = Arc<dyn Fn() -> AnyValue + Send + Sync>;

pub(crate) struct PipelineNode {
    own_steps: Arc<[Step]>,
    parent: Option<Arc<PipelineNode>>,
    initial_context: ValueFactory,
    initial_value: Option<ValueFactory>,
    /// Marca de un solo sentido: se activa al derivar el primer hijo.
    branched: AtomicBool,
    /// Cache perezosa de `flatten`, escrita una sola vez.
    flattened: OnceCell<Arc<[Step]>>,
}

impl PipelineNode {
    pub(crate) fn root(initial_context: ValueFactory) -> Self {
        Self { own_steps: Arc::from(Vec::new()),
               parent: None,
               initial_context,
               initial_value: None,
               branched: AtomicBool::new(false),
               flattened: OnceCell::new() }
    }

    /// Crea el nodo hijo que agrega `step` al final de este prefijo.
    pub(crate) fn child(self: &Arc<Self>, step: Step) -> Arc<Self> {
        let branch_point = self.parent.is_some() || self.branched.swap(true, Ordering::AcqRel);
        let (own_steps, parent): (Arc<[Step]>, _) = if branch_point {
            (Arc::from(vec![step]), Some(Arc::clone(self)))
        } else {
            let mut steps = Vec::with_capacity(self.own_steps.len() + 1);
            steps.extend(self.own_steps.iter().cloned());
            steps.push(step);
            (Arc::from(steps), None)
        };
        Arc::new(Self { own_steps,
                        parent,
                        initial_context: Arc::clone(&self.initial_context),
                        initial_value: self.initial_value.clone(),
                        branched: AtomicBool::new(false),
                        flattened: OnceCell::new() })
    }

    /// Nodo con los mismos pasos (y el mismo `parent`) pero otro valor sembrado.
    pub(crate) fn with_initial_value(&self, initial_value: ValueFactory) -> Arc<Self> {
        Arc::new(Self { own_steps: Arc::clone(&self.own_steps),
                        parent: self.parent.clone(),
                        initial_context: Arc::clone(&self.initial_context),
                        initial_value: Some(initial_value),
                        branched: AtomicBool::new(false),
                        flattened: OnceCell::new() })
    }

    pub(crate) fn initial_context(&self) -> &ValueFactory {
        &self.initial_context
    }

    pub(crate) fn initial_value(&self) -> Option<&ValueFactory> {
        self.initial_value.as_ref()
    }

    pub(crate) fn own_steps(&self) -> &[Step] {
        &self.own_steps
    }

    pub(crate) fn parent(&self) -> Option<&Arc<PipelineNode>> {
        self.parent.as_ref()
    }

    /// Secuencia completa de pasos: historia de los ancestros y luego los
    /// propios. Se calcula una vez por nodo recorriendo la cadena de forma
    /// iterativa hasta el primer ancestro ya resuelto. Sólo se cachea el nodo
    /// pedido; los intermedios no se materializan.
    pub(crate) fn flatten(&self) -> Arc<[Step]> {
        if self.parent.is_none() {
            return Arc::clone(self.flattened.get_or_init(|| Arc::clone(&self.own_steps)));
        }
        if let Some(cached) = self.flattened.get() {
            return Arc::clone(cached);
        }

        let mut segments: Vec<&[Step]> = vec![&self.own_steps[..]];
        let mut inherited: Option<Arc<[Step]>> = None;
        let mut ancestor = self.parent.as_deref();
        while let Some(node) = ancestor {
            if let Some(cached) = node.flattened.get() {
                inherited = Some(Arc::clone(cached));
                break;
            }
            segments.push(&node.own_steps[..]);
            ancestor = node.parent.as_deref();
        }

        let resolved = self.flattened.get_or_init(|| {
            let base = inherited.as_deref().unwrap_or(&[]);
            let total = base.len() + segments.iter().map(|s| s.len()).sum::<usize>();
            trace!("flatten: {} cached + {} linked segments ({total} steps)", base.len(), segments.len());
            let mut steps = Vec::with_capacity(total);
            steps.extend(base.iter().cloned());
            for segment in segments.iter().rev() {
                steps.extend(segment.iter().cloned());
            }
            Arc::from(steps)
        });
        Arc::clone(resolved)
    }
}

// Las ramas largas son listas enlazadas por `parent`; soltarlas de forma
// recursiva desborda la pila.
impl Drop for PipelineNode {
    fn drop(&mut self) {
        while let Some(parent) = self.parent.take() {
            match Arc::into_inner(parent) {
                Some(mut node) => self.parent = node.parent.take(),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::constructors::transform;

    fn root() -> Arc<PipelineNode> {
        Arc::new(PipelineNode::root(Arc::new(|| Box::new(()) as AnyValue)))
    }

    fn add(n: i32) -> Step {
        transform(move |v: i32, _: &()| Ok(v + n))
    }

    #[test]
    fn linear_chain_copies_without_parent_links() {
        let a = root().child(add(1));
        let b = a.child(add(2));
        let c = b.child(add(3));
        assert!(c.parent().is_none());
        assert_eq!(c.own_steps().len(), 3);
        assert_eq!(c.flatten().len(), 3);
    }

    #[test]
    fn second_child_shares_history_through_parent() {
        let base = root().child(add(1));
        let first = base.child(add(2));
        let second = base.child(add(3));

        assert!(first.parent().is_none());
        let parent = second.parent().expect("second branch must point at base");
        assert!(Arc::ptr_eq(parent, &base));
        assert_eq!(second.own_steps().len(), 1);

        // Continuar una rama con parent sigue enlazando en vez de copiar.
        let deeper = second.child(add(4));
        assert!(deeper.parent().is_some_and(|p| Arc::ptr_eq(p, &second)));
        assert_eq!(deeper.flatten().len(), 3);
        assert_eq!(first.flatten().len(), 2);
    }

    #[test]
    fn flatten_is_cached_per_node() {
        let base = root().child(add(1));
        let _ = base.child(add(2));
        let branch = base.child(add(3)).child(add(4));
        let once = branch.flatten();
        let twice = branch.flatten();
        assert!(Arc::ptr_eq(&once, &twice));
    }

    #[test]
    fn seeded_node_keeps_steps_and_parent() {
        let base = root().child(add(1));
        let _ = base.child(add(2));
        let branch = base.child(add(3));
        let seeded = branch.with_initial_value(Arc::new(|| Box::new(5_i32) as AnyValue));
        assert!(seeded.initial_value().is_some());
        assert!(branch.initial_value().is_none());
        assert_eq!(seeded.flatten().len(), 2);
        assert!(seeded.parent().is_some_and(|p| Arc::ptr_eq(p, &base)));
    }

    #[test]
    fn flatten_caches_only_the_requested_node() {
        let base = root().child(add(1));
        let _ = base.child(add(2));
        let middle = base.child(add(3)).child(add(4));
        let tail = middle.child(add(5));

        assert_eq!(tail.flatten().len(), 4);
        assert!(middle.flattened.get().is_none());
        assert_eq!(middle.flatten().len(), 3);
    }

    #[test]
    fn dropping_a_very_deep_branch_does_not_overflow() {
        let base = root().child(add(1));
        let _ = base.child(add(2));
        let mut tail = base.child(add(3));
        for _ in 0..100_000 {
            tail = tail.child(add(1));
        }
        assert!(tail.parent().is_some());
        drop(tail);
        assert_eq!(base.flatten().len(), 1);
    }
}
