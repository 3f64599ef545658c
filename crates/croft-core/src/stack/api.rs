//! Api stack
//!
//! Declares the REST gateway, the user pool with its app client, the
//! authorizer, and the three handlers behind `/item/{itemId}`. Takes the
//! database stack's table handle by value; both item handlers receive
//! the same provisioned table name through `ITEM_TABLE`.
//!
//! Least privilege is a hard invariant here: the read handler is granted
//! exactly read, the write handler exactly write.

use crate::app::AppConfig;
use crate::error::Result;
use crate::model::{
    AuthFlows, Authorization, AuthorizerSpec, FunctionSpec, HttpMethod, IdentityProvider,
    MethodBinding, RestApiSpec, RouteNode, TableHandle, TeardownPolicy, UserPoolClientSpec,
    UserPoolSpec,
};
use crate::naming::resource_name;
use crate::stack::{ITEM_TABLE_ENV, Resource, StackManifest};

pub struct ApiStack {
    pub manifest: StackManifest,
}

impl ApiStack {
    pub fn stack_name(prefix: &str) -> String {
        resource_name(prefix, "ApiStack")
    }

    pub fn compose(config: &AppConfig, items_table: TableHandle) -> Result<Self> {
        let prefix = config.prefix.as_str();
        let mut manifest = StackManifest::new(Self::stack_name(prefix), prefix);

        let pool_name = resource_name(prefix, "UserPool");
        manifest.push(Resource::UserPool(UserPoolSpec {
            name: pool_name.clone(),
            self_sign_up_enabled: true,
            sign_in_email_alias: true,
            teardown: TeardownPolicy::Destroy,
        }))?;

        manifest.push(Resource::UserPoolClient(UserPoolClientSpec {
            name: resource_name(prefix, "UserPoolAppClient"),
            user_pool: pool_name.clone(),
            auth_flows: AuthFlows::all(),
            identity_providers: vec![IdentityProvider::Cognito],
        }))?;

        let health_name = resource_name(prefix, "HealthCheckFunction");
        manifest.push(Resource::Function(FunctionSpec::new(
            health_name.clone(),
            config.lambda_artifact("healthcheck"),
        )))?;

        let get_name = resource_name(prefix, "GetItemFunction");
        manifest.push(Resource::Function(
            FunctionSpec::new(get_name.clone(), config.lambda_artifact("get_item"))
                .with_env(ITEM_TABLE_ENV, items_table.name())
                .grant_read(&items_table),
        ))?;

        let post_name = resource_name(prefix, "PostItemFunction");
        manifest.push(Resource::Function(
            FunctionSpec::new(post_name.clone(), config.lambda_artifact("post_item"))
                .with_env(ITEM_TABLE_ENV, items_table.name())
                .grant_write(&items_table),
        ))?;

        let authorizer = AuthorizerSpec {
            name: resource_name(prefix, "CognitoAuthorizer"),
            user_pools: vec![pool_name],
        };
        let cognito = Authorization::CognitoUserPools {
            authorizer: authorizer.name.clone(),
        };

        let routes = RouteNode::literal("item").child(
            RouteNode::parameter("itemId")
                .bind(MethodBinding {
                    method: HttpMethod::Get,
                    function: get_name,
                    authorization: cognito.clone(),
                })
                .bind(MethodBinding {
                    method: HttpMethod::Post,
                    function: post_name,
                    authorization: cognito,
                })
                // Default route: unmatched methods fall through to the
                // health check without a credential.
                .bind(MethodBinding {
                    method: HttpMethod::Any,
                    function: health_name,
                    authorization: Authorization::None,
                }),
        );

        manifest.push(Resource::RestApi {
            spec: RestApiSpec::new(resource_name(prefix, "RestApi")),
            authorizer,
            routes,
        })?;

        Ok(Self { manifest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableAccess;
    use crate::stack::DatabaseStack;

    fn compose() -> (ApiStack, TableHandle) {
        let config = AppConfig::new("test").unwrap();
        let db = DatabaseStack::compose(&config).unwrap();
        let api = ApiStack::compose(&config, db.items_table.clone()).unwrap();
        (api, db.items_table)
    }

    fn item_routes(api: &ApiStack) -> Vec<(String, MethodBinding)> {
        let Some(Resource::RestApi { routes, .. }) = api.manifest.resource("test-RestApi") else {
            panic!("rest api not declared");
        };
        routes
            .walk()
            .into_iter()
            .map(|(p, b)| (p, b.clone()))
            .collect()
    }

    #[test]
    fn get_is_read_only_and_post_is_write_only() {
        let (api, table) = compose();

        let get = api
            .manifest
            .functions()
            .find(|f| f.name == "test-GetItemFunction")
            .unwrap();
        assert_eq!(get.access_on(&table), vec![TableAccess::Read]);

        let post = api
            .manifest
            .functions()
            .find(|f| f.name == "test-PostItemFunction")
            .unwrap();
        assert_eq!(post.access_on(&table), vec![TableAccess::Write]);
    }

    #[test]
    fn health_check_has_no_grants_and_no_environment() {
        let (api, table) = compose();
        let health = api
            .manifest
            .functions()
            .find(|f| f.name == "test-HealthCheckFunction")
            .unwrap();
        assert!(health.access_on(&table).is_empty());
        assert!(health.environment.is_empty());
    }

    #[test]
    fn both_item_methods_share_one_authorizer() {
        let (api, _) = compose();
        let routes = item_routes(&api);

        let auth_of = |method: HttpMethod| {
            routes
                .iter()
                .find(|(path, b)| path == "/item/{itemId}" && b.method == method)
                .map(|(_, b)| b.authorization.clone())
                .unwrap()
        };

        let get_auth = auth_of(HttpMethod::Get);
        let post_auth = auth_of(HttpMethod::Post);
        assert_eq!(get_auth, post_auth);
        assert_eq!(
            get_auth,
            Authorization::CognitoUserPools {
                authorizer: "test-CognitoAuthorizer".to_string()
            }
        );
    }

    #[test]
    fn default_route_is_unauthenticated_health_check() {
        let (api, _) = compose();
        let routes = item_routes(&api);
        let default = routes
            .iter()
            .find(|(_, b)| b.method == HttpMethod::Any)
            .map(|(_, b)| b)
            .unwrap();
        assert_eq!(default.function, "test-HealthCheckFunction");
        assert_eq!(default.authorization, Authorization::None);
    }

    #[test]
    fn both_handlers_resolve_one_single_table_name() {
        let (api, table) = compose();
        let env_of = |name: &str| {
            api.manifest
                .functions()
                .find(|f| f.name == name)
                .and_then(|f| f.environment.get(ITEM_TABLE_ENV))
                .cloned()
                .unwrap()
        };

        let get_table = env_of("test-GetItemFunction");
        let post_table = env_of("test-PostItemFunction");
        assert_eq!(get_table, post_table);
        assert_eq!(get_table, table.name());
    }

    #[test]
    fn user_pool_allows_self_signup_and_tears_down_with_the_stack() {
        let (api, _) = compose();
        let Some(Resource::UserPool(pool)) = api.manifest.resource("test-UserPool") else {
            panic!("user pool not declared");
        };
        assert!(pool.self_sign_up_enabled);
        assert!(pool.sign_in_email_alias);
        assert!(pool.teardown.is_destroy());
    }

    #[test]
    fn app_client_supports_all_four_auth_flows() {
        let (api, _) = compose();
        let Some(Resource::UserPoolClient(client)) =
            api.manifest.resource("test-UserPoolAppClient")
        else {
            panic!("app client not declared");
        };
        assert_eq!(client.user_pool, "test-UserPool");
        assert_eq!(client.auth_flows, AuthFlows::all());
        assert_eq!(client.identity_providers, vec![IdentityProvider::Cognito]);
    }

    #[test]
    fn authorizer_validates_the_declared_pool() {
        let (api, _) = compose();
        let Some(Resource::RestApi { authorizer, .. }) = api.manifest.resource("test-RestApi")
        else {
            panic!("rest api not declared");
        };
        assert_eq!(authorizer.user_pools, vec!["test-UserPool".to_string()]);
    }
}
