//! Store selector profiles against trimmed-down search page fixtures.

use shopcmp::config::Config;
use shopcmp::sources::StoreAdapter;
use shopcmp::Source;

fn parse(source: Source, html: &str) -> Vec<shopcmp::RawProduct> {
    StoreAdapter::new(source, &Config::default())
        .parse(html)
        .unwrap()
}

#[test]
fn amazon_search_page() {
    let html = r#"
    <div class="s-main-slot">
      <div class="s-result-item" data-component-type="s-search-result">
        <h2><a class="a-link-normal" href="/Black-Cocktail-Dress/dp/B0TEST1"><span>Women's Black Cocktail Dress</span></a></h2>
        <span class="a-price"><span class="a-offscreen">₹1,499.00</span><span class="a-price-whole">1,499</span></span>
        <i class="a-icon a-icon-star-small" aria-label="4.3 out of 5 stars"></i>
        <span class="a-size-base s-underline-text">2,317</span>
        <img class="s-image" src="https://m.media-amazon.test/1.jpg">
      </div>
      <div class="s-result-item" data-component-type="s-search-result">
        <h2><a class="a-link-normal" href="/dp/B0TEST2"><span>Sponsored Dress</span></a></h2>
      </div>
      <div class="s-result-item" data-component-type="s-widget">
        <h2><a href="/ad"><span>Not a result</span></a></h2>
      </div>
    </div>
    "#;

    let products = parse(Source::Amazon, html);
    assert_eq!(products.len(), 2);

    let dress = &products[0];
    assert_eq!(dress.title, "Women's Black Cocktail Dress");
    assert_eq!(dress.link, "https://www.amazon.in/Black-Cocktail-Dress/dp/B0TEST1");
    assert_eq!(dress.price, Some(1499.0));
    assert_eq!(dress.rating, 4.3);
    assert_eq!(dress.reviews, 2317);
    assert_eq!(dress.image.as_deref(), Some("https://m.media-amazon.test/1.jpg"));
    assert_eq!(dress.source, Source::Amazon);

    let bare = &products[1];
    assert_eq!(bare.price, None);
    assert_eq!(bare.rating, 0.0);
    assert_eq!(bare.reviews, 0);
}

#[test]
fn flipkart_search_page() {
    let html = r#"
    <div class="_1AtVbE">
      <a class="_1fQZEK" href="/apple-iphone-15/p/itm123?pid=MOB1">
        <div class="_4rR01T">Apple iPhone 15 (Black, 128 GB)</div>
        <div class="_3LWZlK">4.6</div>
        <span class="_2_R_DZ">1,02,345 Ratings &amp; 4,210 Reviews</span>
        <div class="_30jeq3">₹69,999</div>
        <img class="_396cs4" src="https://rukminim.test/iphone.jpg">
      </a>
    </div>
    <div class="_1AtVbE"><div>filter sidebar</div></div>
    "#;

    let products = parse(Source::Flipkart, html);
    assert_eq!(products.len(), 1);

    let phone = &products[0];
    assert_eq!(phone.title, "Apple iPhone 15 (Black, 128 GB)");
    assert_eq!(phone.link, "https://www.flipkart.com/apple-iphone-15/p/itm123?pid=MOB1");
    assert_eq!(phone.price, Some(69999.0));
    assert_eq!(phone.rating, 4.6);
    assert_eq!(phone.reviews, 102345);
}

#[test]
fn myntra_search_page() {
    let html = r#"
    <ul class="results-base">
      <li class="product-base">
        <a href="dresses/sassafras/sassafras-black-bodycon/123/buy">
          <img class="product-image" src="https://assets.myntra.test/1.jpg">
          <h3 class="product-brand">SASSAFRAS</h3>
          <h4 class="product-product">Black Bodycon Dress</h4>
          <div class="product-ratingsContainer"><span>4.2</span></div>
          <div class="product-ratingsCount">1.1k</div>
          <div class="product-price"><span class="product-discountedPrice">Rs. 1299</span></div>
        </a>
      </li>
    </ul>
    "#;

    let products = parse(Source::Myntra, html);
    assert_eq!(products.len(), 1);

    let dress = &products[0];
    assert_eq!(dress.title, "SASSAFRAS Black Bodycon Dress");
    assert_eq!(
        dress.link,
        "https://www.myntra.com/dresses/sassafras/sassafras-black-bodycon/123/buy"
    );
    assert_eq!(dress.price, Some(1299.0));
    assert_eq!(dress.rating, 4.2);
    // thousands shorthand is not expanded
    assert_eq!(dress.reviews, 1);
}

#[test]
fn snapdeal_search_page() {
    let html = r#"
    <section>
      <div class="product-tuple-listing">
        <a class="dp-widget-link" href="https://www.snapdeal.com/product/running-shoes/6380">
          <img class="product-image" data-src="https://n.sdlcdn.test/shoe.jpg">
        </a>
        <p class="product-title">Campus Running Shoes</p>
        <span class="product-price">Rs.  899</span>
        <div class="rating-stars"><div class="filled-stars" style="width:84%"></div></div>
        <p class="product-rating-count">(56)</p>
      </div>
      <div class="product-tuple-listing">
        <a class="dp-widget-link" href="/product/untitled/1"></a>
      </div>
    </section>
    "#;

    let products = parse(Source::Snapdeal, html);
    // untitled card is dropped
    assert_eq!(products.len(), 1);

    let shoes = &products[0];
    assert_eq!(shoes.title, "Campus Running Shoes");
    assert_eq!(shoes.price, Some(899.0));
    assert!((shoes.rating - 4.2).abs() < 1e-9);
    assert_eq!(shoes.reviews, 56);
    assert_eq!(shoes.image.as_deref(), Some("https://n.sdlcdn.test/shoe.jpg"));
}

#[test]
fn max_results_caps_each_store() {
    let card = r#"<li class="product-base"><a href="/p"><h4 class="product-product">Kurta</h4></a></li>"#;
    let html = card.repeat(25);

    let config = Config {
        fetch: shopcmp::config::FetchSettings {
            max_results: 3,
            ..Default::default()
        },
        ..Config::default()
    };
    let products = StoreAdapter::new(Source::Myntra, &config).parse(&html).unwrap();
    assert_eq!(products.len(), 3);
}
