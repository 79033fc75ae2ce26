//! Registration checks and descriptor synthesis for every endpoint.

use std::collections::{HashMap, HashSet};

use restdoc_core::{
    DataShape, EndpointDeclaration, HttpMethod, ParameterDeclaration, ParameterLocation,
    ResponseDeclaration, Visibility,
};

use crate::error::{Error, Result};
use crate::registry::Endpoints;
use crate::schema::{ComponentTable, Synthesizer, TypeCatalog};
use crate::settings::DocumentSettings;

/// An endpoint with all of its descriptors synthesized.
#[derive(Debug)]
pub(crate) struct Operation<'a> {
    pub decl: &'a EndpointDeclaration,
    pub params: Vec<(&'a ParameterDeclaration, DataShape)>,
    pub body: Option<DataShape>,
    pub responses: Vec<(&'a ResponseDeclaration, Option<DataShape>)>,
}

impl Operation<'_> {
    /// Whether the endpoint is served at `min`.
    pub fn is_served(&self, min: Visibility) -> bool {
        self.decl.visibility() >= min
    }

    /// Copy of this operation without parameters below `min`. Path
    /// parameters are always kept since the route cannot be expanded
    /// without them.
    pub fn filtered(&self, min: Visibility) -> Self {
        Operation {
            decl: self.decl,
            params: self
                .params
                .iter()
                .filter(|(p, _)| {
                    p.location() == ParameterLocation::Path || p.visibility_tier() >= min
                })
                .cloned()
                .collect(),
            body: self.body.clone(),
            responses: self.responses.clone(),
        }
    }
}

/// Validate every endpoint and synthesize its descriptors.
///
/// Returns operations in registration order together with the verified
/// component table.
pub(crate) fn resolve<'a>(
    settings: &DocumentSettings,
    endpoints: &'a Endpoints,
    catalog: &TypeCatalog,
) -> Result<(Vec<Operation<'a>>, ComponentTable)> {
    let mut synth = Synthesizer::new(catalog);
    let mut operations = Vec::with_capacity(endpoints.len());
    let mut routes: HashMap<(HttpMethod, String), &str> = HashMap::new();

    for decl in endpoints.list() {
        check_route(&mut routes, decl)?;
        check_parameters(decl)?;
        check_responses(decl)?;
        check_security(settings, decl)?;
        operations.push(synthesize_operation(&mut synth, decl)?);
    }

    let components = synth.finish()?;
    tracing::debug!(
        operations = operations.len(),
        components = components.len(),
        "endpoints resolved"
    );
    Ok((operations, components))
}

/// Each (method, path) pair renders to one slot under `paths`.
fn check_route<'a>(
    routes: &mut HashMap<(HttpMethod, String), &'a str>,
    decl: &'a EndpointDeclaration,
) -> Result<()> {
    let path = decl.path();
    if let Some(existing) = routes.get(&(decl.method(), path.clone())) {
        return Err(Error::DuplicateRoute {
            method: decl.method().as_str().to_ascii_uppercase(),
            path,
            existing: (*existing).to_string(),
            operation_id: decl.operation_id().to_string(),
        });
    }
    routes.insert((decl.method(), path), decl.operation_id());
    Ok(())
}

fn check_responses(decl: &EndpointDeclaration) -> Result<()> {
    let mut seen = HashSet::new();
    match decl.responses().iter().find(|r| !seen.insert(r.status())) {
        Some(response) => Err(Error::DuplicateResponse {
            operation_id: decl.operation_id().to_string(),
            status: response.status(),
        }),
        None => Ok(()),
    }
}

fn check_parameters(decl: &EndpointDeclaration) -> Result<()> {
    let mut seen = HashSet::new();
    for param in decl.parameters() {
        if !seen.insert(param.name()) {
            return Err(Error::DuplicateParameter {
                operation_id: decl.operation_id().to_string(),
                name: param.name().to_string(),
            });
        }
    }

    let placeholders = decl.route_placeholders();
    let declared: Vec<&str> = decl
        .parameters()
        .iter()
        .filter(|p| p.location() == ParameterLocation::Path)
        .map(ParameterDeclaration::name)
        .collect();

    let unmatched = placeholders
        .iter()
        .copied()
        .find(|name| !declared.contains(name))
        .or_else(|| {
            declared
                .iter()
                .copied()
                .find(|name| !placeholders.contains(name))
        });
    if let Some(name) = unmatched {
        return Err(Error::PathParameterMismatch {
            operation_id: decl.operation_id().to_string(),
            name: name.to_string(),
            route: decl.route().to_string(),
        });
    }
    Ok(())
}

fn check_security(settings: &DocumentSettings, decl: &EndpointDeclaration) -> Result<()> {
    match decl
        .security()
        .iter()
        .find(|req| settings.security_scheme(&req.scheme).is_none())
    {
        Some(req) => Err(Error::UnknownSecurityScheme {
            operation_id: decl.operation_id().to_string(),
            scheme: req.scheme.clone(),
        }),
        None => Ok(()),
    }
}

fn synthesize_operation<'a>(
    synth: &mut Synthesizer<'_>,
    decl: &'a EndpointDeclaration,
) -> Result<Operation<'a>> {
    let params = decl
        .parameters()
        .iter()
        .map(|p| Ok((p, synth.synthesize(p.ty())?)))
        .collect::<Result<Vec<_>>>()?;

    let body = decl
        .request_body()
        .map(|b| synth.synthesize(b.ty()))
        .transpose()?;

    let responses = decl
        .responses()
        .iter()
        .map(|r| {
            let shape = r.body().map(|(_, ty)| synth.synthesize(ty)).transpose()?;
            Ok((r, shape))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Operation {
        decl,
        params,
        body,
        responses,
    })
}
