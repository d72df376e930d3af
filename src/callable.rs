use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::FlattenOptions;
use crate::error::{CallError, FlattenResult};
use crate::plan::{Arguments, ReconstructionPlan};
use crate::record::{FieldSpec, Kwargs};
use crate::signature::{FlattenedSignature, SignatureBuilder};

type Func<R, E> = dyn Fn(Arguments) -> Result<R, E> + Send + Sync;

/// A callable in its original, record-typed shape.
///
/// Pairs a function value with the parameter list it expects. Record
/// parameters are declared with [`FieldSpec::record`] and read back inside
/// the function with [`Arguments::take_record`].
///
/// # Examples
///
/// ```
/// use record_flatten::{Arguments, Callable, DeclaredType, FieldSpec};
///
/// let greet = Callable::new(
///     "greet",
///     vec![FieldSpec::new("name", DeclaredType::Str)],
///     |args: Arguments| args.get::<String>("name").map(|n| format!("hello {n}")),
/// );
///
/// let out = greet.invoke(Arguments::new().with_value("name", "ada")).unwrap();
/// assert_eq!(out, "hello ada");
/// ```
pub struct Callable<R, E> {
    name: String,
    params: Vec<FieldSpec>,
    func: Arc<Func<R, E>>,
    identity: TypeId,
}

impl<R, E> Callable<R, E> {
    /// Wraps `func` with its declared parameters.
    pub fn new<F>(name: impl Into<String>, params: Vec<FieldSpec>, func: F) -> Self
    where
        F: Fn(Arguments) -> Result<R, E> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params,
            func: Arc::new(func),
            identity: TypeId::of::<F>(),
        }
    }

    /// Returns the callable's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared parameters in order.
    pub fn params(&self) -> &[FieldSpec] {
        &self.params
    }

    /// Invokes the function with arguments in their original shape.
    ///
    /// # Errors
    ///
    /// Returns whatever the wrapped function returns.
    pub fn invoke(&self, args: Arguments) -> Result<R, E> {
        (self.func)(args)
    }
}

impl<R, E> Clone for Callable<R, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            params: self.params.clone(),
            func: Arc::clone(&self.func),
            identity: self.identity,
        }
    }
}

impl<R, E> fmt::Debug for Callable<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A callable whose record parameters have been expanded into flat ones.
///
/// Cheap to clone and safe to call from many threads at once: the signature
/// and plan are shared and never mutated.
pub struct FlatCallable<R, E> {
    name: Arc<str>,
    signature: Arc<FlattenedSignature>,
    plan: Arc<ReconstructionPlan>,
    func: Arc<Func<R, E>>,
}

impl<R, E> FlatCallable<R, E> {
    /// Returns the wrapped callable's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the flat parameter list frontends should present.
    pub fn signature(&self) -> &FlattenedSignature {
        &self.signature
    }

    /// Returns the shared signature handle.
    pub fn shared_signature(&self) -> &Arc<FlattenedSignature> {
        &self.signature
    }

    /// Calls the original function with flat keyword arguments.
    ///
    /// Record parameters are rebuilt from their fields before the call; all
    /// other arguments pass through unchanged.
    ///
    /// # Errors
    ///
    /// See [`ReconstructionPlan::bind`] for binding failures; the wrapped
    /// function's own error is returned as [`CallError::Callee`].
    pub fn call(&self, kwargs: Kwargs) -> Result<R, CallError<E>> {
        let args = self.plan.bind(kwargs)?;
        trace!(callable = %self.name, arguments = args.len(), "invoking original callable");
        (self.func)(args).map_err(CallError::Callee)
    }
}

impl<R, E> Clone for FlatCallable<R, E> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            signature: Arc::clone(&self.signature),
            plan: Arc::clone(&self.plan),
            func: Arc::clone(&self.func),
        }
    }
}

impl<R, E> fmt::Debug for FlatCallable<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatCallable")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    identity: TypeId,
    name: String,
}

#[derive(Debug, Clone)]
struct Decoration {
    params: Vec<FieldSpec>,
    signature: Arc<FlattenedSignature>,
    plan: Arc<ReconstructionPlan>,
}

/// Flattens callables, caching the result per callable.
///
/// The signature and reconstruction plan are computed once per callable;
/// flattening the same callable again returns the cached pair.
///
/// # Examples
///
/// ```
/// use record_flatten::{deserialize_record, Arguments, Callable, DeclaredType, FieldSpec, Flattener, Kwargs, Record, RecordError};
/// use serde::Deserialize;
/// use serde_json::json;
///
/// #[derive(Debug, Deserialize)]
/// struct Conn { host: String }
///
/// impl Record for Conn {
///     fn fields() -> Vec<FieldSpec> {
///         vec![FieldSpec::new("host", DeclaredType::Str)]
///     }
///     fn construct(values: Kwargs) -> Result<Self, RecordError> {
///         deserialize_record(values)
///     }
/// }
///
/// let connect = Callable::new(
///     "connect",
///     vec![FieldSpec::record::<Conn>("conn")],
///     |mut args: Arguments| args.take_record::<Conn>("conn").map(|c| c.host),
/// );
///
/// let flat = Flattener::default().flatten(&connect).unwrap();
/// assert_eq!(flat.signature().names().collect::<Vec<_>>(), ["host"]);
///
/// let kwargs = json!({"host": "db"}).as_object().cloned().unwrap();
/// assert_eq!(flat.call(kwargs).unwrap(), "db");
/// ```
#[derive(Debug, Default)]
pub struct Flattener {
    options: FlattenOptions,
    cache: Mutex<HashMap<CacheKey, Decoration>>,
}

impl Flattener {
    /// Creates a flattener with the given options and an empty cache.
    pub fn new(options: FlattenOptions) -> Self {
        Self {
            options,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the options this flattener applies.
    pub fn options(&self) -> &FlattenOptions {
        &self.options
    }

    /// Builds the flat view of `callable`.
    ///
    /// # Errors
    ///
    /// Returns a [`FlattenError`](crate::FlattenError) for colliding names,
    /// malformed records, or choices that cannot become enumerations. Nothing
    /// is cached on failure.
    pub fn flatten<R, E>(&self, callable: &Callable<R, E>) -> FlattenResult<FlatCallable<R, E>> {
        let key = CacheKey {
            identity: callable.identity,
            name: callable.name.clone(),
        };

        if let Some(cached) = self.cached(&key, callable.params()) {
            debug!(callable = %callable.name, "reusing cached flattened signature");
            return Ok(Self::wrap(callable, cached));
        }

        let signature = SignatureBuilder::new(self.options.clone()).build(callable.params())?;
        let plan = ReconstructionPlan::new(&signature);
        debug!(
            callable = %callable.name,
            parameters = signature.len(),
            groups = signature.groups().len(),
            literals_to_enums = self.options.literals_to_enums,
            "flattened signature built"
        );

        let decoration = Decoration {
            params: callable.params.clone(),
            signature: Arc::new(signature),
            plan: Arc::new(plan),
        };
        let decoration = {
            let mut cache = self.cache.lock();
            match cache.get(&key) {
                // Another thread flattened the same callable first.
                Some(existing) if existing.params == decoration.params => existing.clone(),
                _ => {
                    cache.insert(key, decoration.clone());
                    decoration
                }
            }
        };

        Ok(Self::wrap(callable, decoration))
    }

    /// Returns the number of cached callables.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn cached(&self, key: &CacheKey, params: &[FieldSpec]) -> Option<Decoration> {
        self.cache
            .lock()
            .get(key)
            .filter(|decoration| decoration.params == params)
            .cloned()
    }

    fn wrap<R, E>(callable: &Callable<R, E>, decoration: Decoration) -> FlatCallable<R, E> {
        FlatCallable {
            name: Arc::from(callable.name.as_str()),
            signature: decoration.signature,
            plan: decoration.plan,
            func: Arc::clone(&callable.func),
        }
    }
}
