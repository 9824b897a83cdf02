//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a few lines MUST push their logic down into the engine. Keep this module neat and
//! tidy 🙏
//!
//! Each worker thread processes its requests sequentially, so handlers must never block. Every storage and gateway
//! call is asynchronous and is awaited.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use canteen_engine::{
    db_types::{CouponUpdate, NewCoupon},
    order_objects::{CheckoutRequest, OrderQueryFilter, PaymentConfirmation},
    traits::{CanteenDatabase, CouponManagement, OrderManagement, PaymentGateway},
    CheckoutApi,
    CouponApi,
    OrdersApi,
    WebhookReconciler,
};
use log::*;
use razorpay_tools::signatures::WEBHOOK_SIGNATURE_HEADER;
use serde_json::json;

use crate::{
    auth::JwtClaims,
    data_objects::{
        CouponValidationRequest,
        CouponValidationResponse,
        JsonResponse,
        NewCouponRequest,
        NewOrderRequest,
        OrderListParams,
        OrderPlacedResponse,
        PaymentOrderRequest,
        UpdateOrderStatusRequest,
        VerifyPaymentRequest,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payment  ----------------------------------------------------
route!(create_payment_order => Post "/payment/create-order" impl CanteenDatabase, PaymentGateway);
/// Opens a gateway payment order for the cart.
///
/// The cart is priced from the catalog, with the coupon applied if one is given. `amount` must match that price to
/// within a paisa, otherwise the request is rejected and nothing is charged. The response carries the gateway order
/// id and the amount in paise, which is what the checkout widget needs.
pub async fn create_payment_order<B: CanteenDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<PaymentOrderRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create-order for {}", claims.sub);
    let request = CheckoutRequest::from(body.into_inner());
    let intent = api.begin_checkout(&request, &claims.identity()).await?;
    Ok(HttpResponse::Ok().json(intent))
}

route!(verify_payment => Post "/payment/verify" impl CanteenDatabase, PaymentGateway);
/// Checks a payment signature from the checkout widget. Nothing is stored.
pub async fn verify_payment<B: CanteenDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let confirmation = PaymentConfirmation::from(body.into_inner());
    debug!("💻️ POST verify payment {} for {}", confirmation.payment_id, claims.sub);
    api.verify_payment(&confirmation)?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Payment verified successfully")))
}

route!(payment_webhook => Post "/payment/webhook" impl OrderManagement, PaymentGateway);
/// Gateway webhook receiver.
///
/// The body is taken as raw bytes because the signature covers them exactly as sent. Only a missing or bad signature
/// is refused. Everything else is acknowledged with `{"status": "ok"}` so the gateway stops retrying.
pub async fn payment_webhook<B: OrderManagement, G: PaymentGateway>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<WebhookReconciler<B, G>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received webhook ({} bytes)", body.len());
    let signature = req.headers().get(WEBHOOK_SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let outcome = api.handle_event(&body, signature).await?;
    debug!("💻️ Webhook acknowledged. {outcome:?}");
    Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl CanteenDatabase, PaymentGateway);
/// Places an order.
///
/// With `paymentOrderId`, `paymentId` and `paymentSignature` the payment is verified and the order is stored as paid.
/// Sending the same payment again returns the order that was already placed for it. Without payment fields the order
/// is stored unpaid, which the server only allows when configured to.
pub async fn create_order<B: CanteenDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let identity = claims.identity();
    debug!("💻️ POST new order for {}", identity.user_id);
    let (request, confirmation) = body.into_inner().into_parts()?;
    let order = match confirmation {
        Some(confirmation) => api.complete_checkout(&confirmation, request, &identity).await?,
        None => api.place_unpaid_order(request, &identity).await?,
    };
    Ok(HttpResponse::Created().json(OrderPlacedResponse::from(order)))
}

route!(orders => Get "/orders" impl OrderManagement);
/// Lists orders, newest first.
///
/// Admins may filter by `userId` and `status`. Everyone else only ever sees their own orders, whatever `userId` says.
pub async fn orders<B: OrderManagement>(
    claims: JwtClaims,
    params: web::Query<OrderListParams>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = OrderQueryFilter::try_from(params.into_inner())?;
    debug!("💻️ GET orders for {}", claims.sub);
    let orders = api.search_orders(query, &claims.identity()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement);
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrdersApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET order {id} for {}", claims.sub);
    let order = api.fetch_order(id, &claims.identity()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Patch "/orders/{id}" impl CanteenDatabase, PaymentGateway);
/// Admins only. Moves an order to any status.
pub async fn update_order_status<B: CanteenDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateOrderStatusRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let status = body.into_inner().status;
    debug!("💻️ PATCH order {id} to {status} by {}", claims.sub);
    let order = api.update_order_status(id, status, &claims.identity()).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Coupons  ----------------------------------------------------
route!(validate_coupon => Post "/coupons/validate" impl CouponManagement);
/// Checks a coupon against an order total. A coupon that does not apply gets a 400 with `valid: false` and the reason.
pub async fn validate_coupon<B: CouponManagement>(
    body: web::Json<CouponValidationRequest>,
    api: web::Data<CouponApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let CouponValidationRequest { code, order_total } = body.into_inner();
    trace!("💻️ Validating coupon {code} against {order_total}");
    let response = CouponValidationResponse::from(api.evaluate(&code, order_total).await?);
    if response.valid {
        Ok(HttpResponse::Ok().json(response))
    } else {
        Ok(HttpResponse::BadRequest().json(response))
    }
}

route!(coupons => Get "/coupons" impl CouponManagement);
/// Admins only. Every coupon, newest first.
pub async fn coupons<B: CouponManagement>(
    claims: JwtClaims,
    api: web::Data<CouponApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET coupons for {}", claims.sub);
    let coupons = api.coupons(&claims.identity()).await?;
    Ok(HttpResponse::Ok().json(coupons))
}

route!(create_coupon => Post "/coupons" impl CouponManagement);
pub async fn create_coupon<B: CouponManagement>(
    claims: JwtClaims,
    body: web::Json<NewCouponRequest>,
    api: web::Data<CouponApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let coupon = NewCoupon::from(body.into_inner());
    debug!("💻️ POST coupon {} by {}", coupon.code, claims.sub);
    let coupon = api.create_coupon(coupon, &claims.identity()).await?;
    Ok(HttpResponse::Created().json(coupon))
}

route!(coupon_by_id => Get "/coupons/{id}" impl CouponManagement);
pub async fn coupon_by_id<B: CouponManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CouponApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET coupon {id} for {}", claims.sub);
    let coupon = api.coupon(id, &claims.identity()).await?;
    Ok(HttpResponse::Ok().json(coupon))
}

route!(update_coupon => Patch "/coupons/{id}" impl CouponManagement);
/// Admins only. Fields left out of the body are unchanged. `null` clears `maxDiscount`, `minOrderValue` or
/// `expiresAt`.
pub async fn update_coupon<B: CouponManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<CouponUpdate>,
    api: web::Data<CouponApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PATCH coupon {id} by {}", claims.sub);
    let coupon = api.update_coupon(id, body.into_inner(), &claims.identity()).await?;
    Ok(HttpResponse::Ok().json(coupon))
}

route!(delete_coupon => Delete "/coupons/{id}" impl CouponManagement);
pub async fn delete_coupon<B: CouponManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CouponApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE coupon {id} by {}", claims.sub);
    api.delete_coupon(id, &claims.identity()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Coupon deleted successfully" })))
}
