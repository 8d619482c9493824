//! Thread-local "current context" selection.
//!
//! Every engine call takes an explicit [`LayoutContext`]. Code that would
//! rather not thread the context through can select one per thread and reach
//! it with [`with_current_context`]. Contexts selected on one thread are never
//! visible on another.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::LayoutContext;

/// A context that can be selected as current.
pub type SharedContext<P = ()> = Rc<RefCell<LayoutContext<P>>>;

thread_local! {
    static CURRENT: RefCell<Option<Rc<dyn Any>>> = const { RefCell::new(None) };
}

/// Wraps `context` so it can be selected as current.
pub fn share<P: 'static>(context: LayoutContext<P>) -> SharedContext<P> {
    Rc::new(RefCell::new(context))
}

/// Makes `context` the current context of this thread, replacing any other.
pub fn set_current_context<P: 'static>(context: SharedContext<P>) {
    let context: Rc<dyn Any> = context;
    CURRENT.with(|current| *current.borrow_mut() = Some(context));
}

/// The current context, if one is set and its payload type is `P`.
pub fn current_context<P: 'static>() -> Option<SharedContext<P>> {
    let context = CURRENT.with(|current| current.borrow().clone())?;
    context.downcast::<RefCell<LayoutContext<P>>>().ok()
}

/// Runs `f` on the current context.
///
/// Returns `None` without calling `f` when no context of payload type `P` is
/// selected or the context is already borrowed further up the stack.
pub fn with_current_context<P: 'static, R>(f: impl FnOnce(&mut LayoutContext<P>) -> R) -> Option<R> {
    let context = current_context::<P>()?;
    let mut context = context.try_borrow_mut().ok()?;
    Some(f(&mut context))
}

/// Deselects the current context. Returns whether one was selected.
pub fn clear_current_context() -> bool {
    CURRENT.with(|current| current.borrow_mut().take().is_some())
}

pub fn has_current_context() -> bool {
    CURRENT.with(|current| current.borrow().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Dimensions;

    fn context() -> LayoutContext<()> {
        let mut context = LayoutContext::new(Dimensions::new(320.0, 240.0));
        context.set_panic_on_usage_error(false);
        context
    }

    #[test]
    fn selection_is_explicit() {
        clear_current_context();
        assert!(!has_current_context());
        assert_eq!(with_current_context::<(), _>(|ctx| ctx.generation()), None);

        let first = share(context());
        set_current_context(Rc::clone(&first));
        assert!(has_current_context());
        with_current_context::<(), _>(|ctx| {
            ctx.begin_layout();
            ctx.end_layout();
        });
        assert_eq!(first.borrow().generation(), 1);

        let second = share(context());
        set_current_context(Rc::clone(&second));
        assert_eq!(with_current_context::<(), _>(|ctx| ctx.generation()), Some(0));

        assert!(clear_current_context());
        assert!(!clear_current_context());
    }

    #[test]
    fn payload_type_must_match() {
        set_current_context(share(LayoutContext::<u32>::new(Dimensions::new(10.0, 10.0))));
        assert!(current_context::<()>().is_none());
        assert!(current_context::<u32>().is_some());
        clear_current_context();
    }

    #[test]
    fn reentrant_access_is_refused() {
        set_current_context(share(context()));
        let nested = with_current_context::<(), _>(|_| with_current_context::<(), _>(|ctx| ctx.generation()));
        assert_eq!(nested, Some(None));
        clear_current_context();
    }

    #[test]
    fn threads_do_not_share_a_selection() {
        set_current_context(share(context()));
        let seen = std::thread::spawn(has_current_context).join().unwrap();
        assert!(!seen);
        clear_current_context();
    }
}
