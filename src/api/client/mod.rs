pub mod http;
mod response;

use crate::api::error::Error;
use crate::api::models::{Credentials, IdValue, LoginResponse, Payment, User};
use crate::api::normalize::Envelope;
use mockall::automock;
use std::future::Future;
use std::sync::Arc;

#[automock]
pub trait ApiClient {
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginResponse, Error>> + Send;

    /// Asks the backend to mail a one-time code. Yields the server's confirmation text, if any.
    fn send_otp(&self, email: &str) -> impl Future<Output = Result<Option<String>, Error>> + Send;

    fn get_users(
        &self,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Envelope<User>, Error>> + Send;

    fn get_user(&self, id: &IdValue) -> impl Future<Output = Result<User, Error>> + Send;

    fn get_payments(
        &self,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Envelope<Payment>, Error>> + Send;

    fn get_receipt_url(&self, payment_id: u64) -> impl Future<Output = Result<String, Error>> + Send;
}

impl<T: ApiClient + Send + Sync> ApiClient for Arc<T> {
    fn login(&self, credentials: &Credentials) -> impl Future<Output = Result<LoginResponse, Error>> + Send {
        (**self).login(credentials)
    }

    fn send_otp(&self, email: &str) -> impl Future<Output = Result<Option<String>, Error>> + Send {
        (**self).send_otp(email)
    }

    fn get_users(&self, page: u32, limit: u32) -> impl Future<Output = Result<Envelope<User>, Error>> + Send {
        (**self).get_users(page, limit)
    }

    fn get_user(&self, id: &IdValue) -> impl Future<Output = Result<User, Error>> + Send {
        (**self).get_user(id)
    }

    fn get_payments(&self, page: u32, limit: u32) -> impl Future<Output = Result<Envelope<Payment>, Error>> + Send {
        (**self).get_payments(page, limit)
    }

    fn get_receipt_url(&self, payment_id: u64) -> impl Future<Output = Result<String, Error>> + Send {
        (**self).get_receipt_url(payment_id)
    }
}
