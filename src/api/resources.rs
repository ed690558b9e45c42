//! Directory resources (departments, users, equipment): plain CRUD, each call
//! checked against the evaluator before it is sent.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;
use crate::gateway::{segment, ApiGateway, ApiRequest};
use crate::identity::{Action, Authorizer, CapabilityRequest, ResourceType};

use super::models::{Department, Equipment, UserAccount};

pub struct ResourceApi<T> {
    gateway: Arc<ApiGateway>,
    authz: Authorizer,
    resource: ResourceType,
    base: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceApi<T> {
    fn clone(&self) -> Self {
        Self { gateway: self.gateway.clone(), authz: self.authz.clone(), resource: self.resource, base: self.base, _marker: PhantomData }
    }
}

pub type DepartmentsApi = ResourceApi<Department>;
pub type UsersApi = ResourceApi<UserAccount>;
pub type EquipmentApi = ResourceApi<Equipment>;

impl ResourceApi<Department> {
    pub fn departments(gateway: Arc<ApiGateway>, authz: Authorizer) -> Self {
        Self::new(gateway, authz, ResourceType::Department, "/departments")
    }
}

impl ResourceApi<UserAccount> {
    pub fn users(gateway: Arc<ApiGateway>, authz: Authorizer) -> Self {
        Self::new(gateway, authz, ResourceType::User, "/users")
    }
}

impl ResourceApi<Equipment> {
    pub fn equipment(gateway: Arc<ApiGateway>, authz: Authorizer) -> Self {
        Self::new(gateway, authz, ResourceType::Equipment, "/equipment")
    }
}

impl<T: DeserializeOwned> ResourceApi<T> {
    fn new(gateway: Arc<ApiGateway>, authz: Authorizer, resource: ResourceType, base: &'static str) -> Self {
        Self { gateway, authz, resource, base, _marker: PhantomData }
    }

    fn item_path(&self, id: &str) -> String { format!("{}/{}", self.base, segment(id)) }

    /// Listing has no single owner; for users that makes it admin-only.
    pub async fn list(&self) -> AppResult<Vec<T>> {
        self.authz.require(&CapabilityRequest::new(Action::View, self.resource))?;
        self.gateway.send_json(ApiRequest::get(self.base)).await
    }

    pub async fn get(&self, id: &str) -> AppResult<T> {
        self.authz.require(&CapabilityRequest::new(Action::View, self.resource).owned_by(id))?;
        self.gateway.send_json(ApiRequest::get(self.item_path(id))).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> AppResult<T> {
        self.authz.require(&CapabilityRequest::new(Action::Create, self.resource))?;
        self.gateway.send_json(ApiRequest::post(self.base).json(body)?).await
    }

    pub async fn update<B: Serialize + ?Sized>(&self, id: &str, body: &B) -> AppResult<T> {
        self.authz.require(&CapabilityRequest::new(Action::Edit, self.resource).owned_by(id))?;
        self.gateway.send_json(ApiRequest::put(self.item_path(id)).json(body)?).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.authz.require(&CapabilityRequest::new(Action::Delete, self.resource).owned_by(id))?;
        self.gateway.send(ApiRequest::delete(self.item_path(id))).await.map(|_| ())
    }
}
